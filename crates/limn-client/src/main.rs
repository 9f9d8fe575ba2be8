use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio::sync::oneshot;
use tracing::info;

use limn_client::publish::{self, PublishConfig};
use limn_client::render::{FrameDump, RenderLoop};
use limn_client::session::{EventLog, SessionContext};
use limn_client::view::{self, ViewConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Role {
    /// Send local video to the relay.
    Publish,
    /// Receive video plus annotations and composite them.
    View,
}

#[derive(Parser, Debug)]
#[command(name = "limn-client")]
struct Args {
    #[arg(long, value_enum, default_value = "view")]
    role: Role,

    /// Base URL of the signaling relay.
    #[arg(long, default_value = "http://localhost:8080")]
    signal_url: String,

    /// Signaling name used when publishing.
    #[arg(long, default_value = "Publisher")]
    name: String,

    /// Canvas size.
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Natural size of the incoming video (viewer role).
    #[arg(long, default_value_t = 1280)]
    video_width: u32,
    #[arg(long, default_value_t = 720)]
    video_height: u32,

    /// Capture device node (publisher role).
    #[arg(long)]
    device: Option<PathBuf>,

    /// Use the synthetic capture source instead of a device.
    #[arg(long, default_value = "false")]
    test_pattern: bool,

    /// Render loop rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Write composited frames as PPM files into this directory.
    #[arg(long)]
    dump_frames: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    limn_core::init_tracing();
    let args = Args::parse();

    let log = EventLog::new();
    let ctx = SessionContext::connect(log).await?;

    match args.role {
        Role::Publish => {
            publish::start(
                ctx.clone(),
                PublishConfig {
                    signal_url: args.signal_url.clone(),
                    name: args.name.clone(),
                    device: args.device.clone(),
                    test_pattern: args.test_pattern,
                    width: args.video_width,
                    height: args.video_height,
                    fps: args.fps,
                },
            )
            .await?;
            info!("publishing as {}", args.name);
        }
        Role::View => {
            let id = view::start(
                ctx.clone(),
                ViewConfig {
                    signal_url: args.signal_url.clone(),
                    video_width: args.video_width,
                    video_height: args.video_height,
                },
            )
            .await?;
            info!("viewing as {id}");
        }
    }

    let dump = match args.dump_frames {
        Some(dir) => Some(FrameDump::new(dir, 30)?),
        None => None,
    };
    let render = RenderLoop::new(&ctx.handle, args.width, args.height);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let render_task = tokio::spawn(render.run(args.fps, shutdown_rx, dump));

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    let _ = shutdown_tx.send(());
    render_task.await?;
    Ok(())
}
