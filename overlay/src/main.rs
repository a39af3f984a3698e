//! Scripted demo of the overlay engine
//!
//! Drives the engine against an in-memory page: opens a magnet locator
//! over a synthetic player, perturbs the scene for a while, and logs what
//! the overlay does. In production the `Page` implementation would bridge
//! to a real host surface instead.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use calque_core::{CalqueConfig, NodeId, Page, PageEvent, Rect, SimPage};
use calque_overlay::{CloseOptions, OverlayController};

const FRAME: Duration = Duration::from_millis(16); // ~60 FPS

#[derive(Parser)]
#[command(name = "calque-demo", about = "Rectangle-tracking overlay demo")]
struct Args {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 180)]
    frames: u32,

    /// Perturbation to run against the tracked player
    #[arg(long, value_enum, default_value_t = Scenario::Scroll)]
    scenario: Scenario,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// Continuous scrolling shifts the player rect every frame
    Scroll,
    /// A blocking panel opens mid-run, then closes
    Modal,
    /// The player container goes fullscreen, then leaves it
    Fullscreen,
}

struct Scene {
    player: NodeId,
    panel: NodeId,
}

fn build_scene(page: &mut SimPage) -> Scene {
    let body = page.body();

    let player = page.insert("div", body);
    page.set_dom_id(player, "playerWrap");
    page.set_rect(player, Rect::new(200.0, 140.0, 640.0, 360.0));
    let video = page.insert("video", player);
    page.set_rect(video, Rect::new(200.0, 140.0, 640.0, 360.0));

    let panel = page.insert("div", body);
    page.add_class(panel, "streamurl-overlay");
    page.set_display_none(panel, true);

    Scene { player, panel }
}

fn perturb(page: &mut SimPage, scene: &Scene, scenario: Scenario, frame: u32, frames: u32) {
    match scenario {
        Scenario::Scroll => {
            if let Some(rect) = page.rect_of(scene.player) {
                page.set_rect(
                    scene.player,
                    Rect::new(rect.left, rect.top - 2.0, rect.width, rect.height),
                );
            }
            page.push_event(PageEvent::Scroll);
        }
        Scenario::Modal => {
            if frame == frames / 3 {
                info!("blocking panel opens");
                page.set_display_none(scene.panel, false);
            } else if frame == frames * 2 / 3 {
                info!("blocking panel closes");
                page.set_display_none(scene.panel, true);
            }
        }
        Scenario::Fullscreen => {
            if frame == frames / 3 {
                info!("player enters fullscreen");
                page.enter_fullscreen(scene.player);
            } else if frame == frames * 2 / 3 {
                info!("player leaves fullscreen");
                page.exit_fullscreen();
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = CalqueConfig::default();

    let mut page = SimPage::new();
    let scene = build_scene(&mut page);

    let mut controller = OverlayController::new(page, &config);
    if let Err(e) = controller.open("magnet:?xt=urn:btih:calquedemo").await {
        warn!(error = %e, "widget script did not load, overlay tracks anyway");
    }
    info!(open = controller.is_open(), "overlay opened");

    for frame in 0..args.frames {
        perturb(
            controller.page_mut(),
            &scene,
            args.scenario,
            frame,
            args.frames,
        );
        controller.on_frame();

        if frame % 30 == 0 {
            let rect = controller
                .overlay_root()
                .and_then(|root| controller.page().rect_of(root));
            info!(
                frame,
                suspended = controller.is_suspended(),
                ?rect,
                "overlay status"
            );
        }

        tokio::time::sleep(FRAME).await;
    }

    controller.close(CloseOptions::default());
    info!(
        open = controller.is_open(),
        widget_pushes = controller.page().widget_queue().len(),
        "demo finished"
    );
}
