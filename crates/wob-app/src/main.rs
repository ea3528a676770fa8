//! # wob
//!
//! WOB 텔레메트리 클라이언트 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 운영자 명령 입력, 라이프사이클 관리.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::Parser;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wob_app::commands::{Command, HELP};
use wob_app::controller::{Controller, Ports};
use wob_app::device::{DesktopWakeLock, LogHaptics};
use wob_app::event_bus::{AppEvent, EventBus};
use wob_app::lifecycle::LifecycleManager;
use wob_app::settings::{self, CliOverrides};
use wob_core::ports::device::Visibility;
use wob_core::ports::socket::SocketConnector;
use wob_network::endpoint;
use wob_network::{LoopbackConnector, WsConnector};
use wob_sensors::desktop::DesktopPlatform;

/// 종료 신호 후 컨트롤러 정리를 기다리는 최대 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(name = "wob")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TouchDesigner 주소 (host[:port])
    #[arg(long, short = 'a')]
    address: Option<String>,

    /// 보안 연결 사용 (wss://)
    #[arg(long)]
    secure: bool,

    /// 센서 전송 주기 (Hz)
    #[arg(long, short = 'r')]
    sample_rate: Option<u32>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 wob/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 실제 서버 대신 루프백 소켓 사용 (모든 연결 수락, 프레임 폐기)
    #[arg(long)]
    dry_run: bool,
}

/// 배너 출력
fn print_banner(dry_run: bool) {
    println!();
    println!("┌──────────────────────────────────────────┐");
    println!("│  WOB — Web-OSC-Bridge telemetry client   │");
    if dry_run {
        println!("│  루프백 모드 (dry-run)                   │");
    }
    println!("│  'help' 입력 시 명령 목록                │");
    println!("└──────────────────────────────────────────┘");
    println!();
}

/// 표준 입력 → 명령 채널.
///
/// 블로킹 읽기는 런타임 종료를 붙잡지 않도록 별도 OS 스레드에서 한다.
fn spawn_stdin_reader(tx: mpsc::Sender<Command>) {
    let spawned = std::thread::Builder::new()
        .name("wob-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!("표준 입력 읽기 실패: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(command) => {
                        if tx.blocking_send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        });
    if let Err(e) = spawned {
        warn!("명령 입력 스레드 생성 실패: {e}");
    }
}

/// 운영자 요청 이벤트 출력
fn spawn_printer(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(AppEvent::ConnectionChanged(state)) => println!("● {}", state.label()),
                Ok(AppEvent::Status(report)) => println!("{}", report.format_line()),
                Ok(AppEvent::Log(entries)) => {
                    for entry in entries.iter().rev() {
                        println!("{}", entry.format_line());
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "wob={},wob_app={},wob_core={},wob_sensors={},wob_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    // 설정 로드 (기본값 → 파일 → 환경변수 → CLI)
    let overrides = CliOverrides {
        address: args.address.clone(),
        secure: args.secure.then_some(true),
        sample_rate: args.sample_rate,
    };
    let config = settings::load(args.config.as_deref(), &overrides)
        .map_err(|e| anyhow!("설정 오류: {}", e))?;

    // 연결 전에 주소 검증
    if let Some(address) = config.server.address.as_deref() {
        let url = endpoint::resolve_url(address, config.server.secure)
            .map_err(|e| anyhow!("주소 오류: {}", e))?;
        info!("엔진: {}", url);
    }

    print_banner(args.dry_run);
    info!("WOB 클라이언트 시작 ({}Hz)", config.broadcast.sample_rate);

    let connector: Arc<dyn SocketConnector> = if args.dry_run {
        info!("dry-run: 루프백 소켓 사용");
        Arc::new(LoopbackConnector::new())
    } else {
        Arc::new(WsConnector::new())
    };

    // 데스크톱에는 화면 표시 상태 변화가 없다
    let (_visibility_tx, visibility) = watch::channel(Visibility::Visible);
    let ports = Ports {
        sensor_platform: Arc::new(DesktopPlatform::new()),
        touch_surface: None,
        connector,
        wake_lock: Arc::new(DesktopWakeLock::new()),
        haptics: Arc::new(LogHaptics::new()),
        visibility,
    };

    let bus = Arc::new(EventBus::default());
    spawn_printer(&bus);

    let (command_tx, command_rx) = mpsc::channel(32);
    spawn_stdin_reader(command_tx);

    let lifecycle = LifecycleManager::new();
    let controller = Controller::new(config, ports, Arc::clone(&bus));
    let mut handle = tokio::spawn(controller.run(command_rx, lifecycle.subscribe()));

    tokio::select! {
        _ = lifecycle.wait_for_signal() => {}
        result = &mut handle => {
            if let Err(e) = result {
                warn!("컨트롤러 태스크 비정상 종료: {e}");
            }
            info!("WOB 클라이언트 종료");
            return Ok(());
        }
    }

    lifecycle.shutdown_within(handle, SHUTDOWN_GRACE).await;
    info!("WOB 클라이언트 종료");
    Ok(())
}
