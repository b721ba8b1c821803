//! Plastome Toolkit - chloroplast genome region finder and nucleotide diversity calculator

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod app;

use app::PlastomeApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 560.0])
            .with_title("Plastome Toolkit"),
        ..Default::default()
    };

    eframe::run_native(
        "Plastome Toolkit",
        native_options,
        Box::new(|cc| Ok(Box::new(PlastomeApp::new(cc)))),
    )
}
