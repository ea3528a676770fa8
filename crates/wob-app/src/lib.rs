//! # wob-app
//!
//! WOB 텔레메트리 클라이언트의 조립 지점.
//! 전송 계층, 센서/터치 소스, 브로드캐스트 스케줄러를 와이어링하고
//! 원격 설정 적용, 자동 시작, 화면 꺼짐 방지, 운영자 명령을 오케스트레이션한다.

pub mod broadcast;
pub mod commands;
pub mod controller;
pub mod device;
pub mod event_bus;
pub mod lifecycle;
pub mod settings;
