use reverbscope::dsp::hall::HallReverb;
use reverbscope::gui::{self, ScopeApp};
use reverbscope::scan::SAMPLE_RATE;
use reverbscope::spectral::find_dft;

fn main() -> Result<(), eframe::Error> {
    //
    // Initialize logging with default filter set to "info".
    //
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting reverb decay spectrogram...");

    //
    // Warm the DFT plan cache before the first frame.
    //
    let plan = find_dft(reverbscope::scan::WINDOW_SIZE);
    log::info!("DFT backend: {}", plan.name());

    //
    // Throwaway reverb instance measured on the UI thread; it never
    // touches a real audio stream.
    //
    let engine = Box::new(HallReverb::new(SAMPLE_RATE as f32));

    //
    // Initialize GUI configuration.
    //
    log::info!("Initializing GUI...");
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([560.0, 560.0])
            .with_min_inner_size([480.0, 480.0])
            .with_title("reverbscope"),
        ..Default::default()
    };

    //
    // Launch GUI application.
    //
    eframe::run_native(
        "reverbscope",
        options,
        Box::new(move |cc| {
            gui::theme::setup_global_style(&cc.egui_ctx);

            Ok(Box::new(ScopeApp::new(cc, engine)))
        }),
    )
}
