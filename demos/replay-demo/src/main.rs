/*
[INPUT]:  RUST_LOG filter from the environment; no CLI arguments
[OUTPUT]: A scripted build, save, reload, replay walkthrough with logs
[POS]:    Demo binary entry point
[UPDATE]: When the walkthrough script or the AppState wiring changes
*/

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tapdeck_core::{
    AppConfig, AppState, Block, BlockTarget, ChannelPresenter, ExecutionHighlights, Presenter,
    ScreenPoint, SurfaceBounds, SurfaceEvent, TAP_FEEDBACK,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let dir = TempDir::new().context("create demo data dir")?;
    let config = AppConfig {
        data_dir: Some(dir.path().to_path_buf()),
        autosave: true,
    };
    // A phone-shaped surface at twice the device scale.
    let surface = SurfaceBounds::new(640.0, 1440.0).context("surface dimensions")?;

    let (channel, events) = ChannelPresenter::new();
    let presenter: Arc<dyn Presenter> = Arc::new(channel);
    let event_log = spawn_event_log(events);

    println!("=== Tap Replay Demo ===");

    println!("1. Building a task...");
    let mut app = AppState::load(&config, presenter.clone()).await?;
    let task_id = app.create_task().await?;
    app.rename_task(task_id, "unlock and cycle").await?;

    // Dragging (40,90) -> (600,1400) on this surface assigns the
    // device-space region (20,45)..(300,700).
    let area_tap = app.add_tap(BlockTarget::Root).await?;
    app.arm_block(area_tap, surface)?;
    app.pointer_down(ScreenPoint::new(40.0, 90.0));
    app.pointer_moved(ScreenPoint::new(600.0, 1400.0));
    app.pointer_up(surface).await?;

    // A click with no movement pins the loop's tap to one device point.
    let cycle = app.add_loop(BlockTarget::Root, 2).await?;
    let point_tap = app.add_tap(BlockTarget::Inside(cycle)).await?;
    app.arm_block(point_tap, surface)?;
    app.pointer_down(ScreenPoint::new(320.0, 720.0));
    app.pointer_up(surface).await?;

    // The wrapped tap stays unconfigured, so replay walks it but skips it.
    let wrapper = app.add_function(BlockTarget::Root).await?;
    app.add_tap(BlockTarget::Inside(wrapper)).await?;
    app.disarm();

    let task = app.current_task().context("current task")?;
    println!("   '{}' holds {} blocks:", task.name, task.block_count());
    print_tree(&task.blocks, 1);

    println!("\n2. Saving and reloading the collection...");
    app.save().await?;
    drop(app);

    let mut app = AppState::load(&config, presenter).await?;
    let restored = app.tasks().first().context("task missing after reload")?;
    println!(
        "   restored '{}' ({} blocks)",
        restored.name,
        restored.block_count()
    );
    let restored_id = restored.id;
    app.select_task(restored_id)?;

    println!("\n3. Replaying at {:?} per tap (Ctrl-C cancels)...", TAP_FEEDBACK);
    setup_signal_handler(app.engine().cancellation_token());

    let report = app.execute_current().await?;
    println!(
        "   entered {} blocks, performed {} taps, skipped {}, errors {}, cancelled {}",
        report.blocks_entered,
        report.taps_performed,
        report.taps_skipped,
        report.errors,
        report.cancelled
    );
    println!("   elapsed {:.1?}", report.elapsed);

    drop(app);
    event_log.await.context("event log task")?;

    println!("\n=== Demo completed ===");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

/// Consumes surface events the way a UI would: fold the highlight set,
/// log everything else.
fn spawn_event_log(mut events: UnboundedReceiver<SurfaceEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut highlights = ExecutionHighlights::new();
        while let Some(event) = events.recv().await {
            highlights.apply(&event);
            match event {
                SurfaceEvent::BlockEntered(id) => info!(block_id = %id, "highlight on"),
                SurfaceEvent::BlockExited(id) => info!(block_id = %id, "highlight off"),
                SurfaceEvent::TapFeedback(point) => {
                    info!(x = point.x, y = point.y, "tap landed");
                }
                SurfaceEvent::RegionChanged(id, region) => {
                    info!(
                        block_id = %id,
                        x = region.min_x(),
                        y = region.min_y(),
                        width = region.width(),
                        height = region.height(),
                        "region assigned"
                    );
                }
                SurfaceEvent::TaskListChanged => info!("task list changed"),
            }
        }
    })
}

fn print_tree(blocks: &[Block], depth: usize) {
    let indent = "  ".repeat(depth);
    for block in blocks {
        match block {
            Block::Tap { region, .. } => match region {
                Some(region) => println!(
                    "{indent}- tap ({:.0},{:.0})..({:.0},{:.0})",
                    region.min_x(),
                    region.min_y(),
                    region.max_x(),
                    region.max_y()
                ),
                None => println!("{indent}- tap (unconfigured)"),
            },
            Block::Loop {
                iterations, blocks, ..
            } => {
                println!("{indent}- loop x{iterations}");
                print_tree(blocks, depth + 1);
            }
            Block::Function { blocks, .. } => {
                println!("{indent}- function");
                print_tree(blocks, depth + 1);
            }
        }
    }
}

fn setup_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT; cancelling replay");
        shutdown.cancel();
    });
}
