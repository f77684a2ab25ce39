pub mod knob;
pub mod theme;

use crate::dsp::{DspEngine, PARAM_DAMPEN, PARAM_DECAY, PARAM_WET_LEVEL};
use crate::scan::{DecayScan, MIN_SECONDS};
use eframe::egui;
use knob::LabelledKnob;
use std::time::{Duration, Instant};

//
// Raster dimensions and the per-frame analysis budget.
//
const IMAGE_WIDTH: usize = 480;
const IMAGE_HEIGHT: usize = 360;
const TICK_BUDGET: Duration = Duration::from_millis(10);

const DECAY_MARKS: [(f32, &str); 5] = [
    (0.5, "½s"),
    (1.0, "1s"),
    (2.0, "2s"),
    (4.0, "4s"),
    (8.0, "8s"),
];

const FREQ_MARKS: [(f32, &str); 8] = [
    (125.0, "125 Hz"),
    (250.0, "250 Hz"),
    (500.0, "500 Hz"),
    (1000.0, "1 kHz"),
    (2000.0, "2 kHz"),
    (4000.0, "4 kHz"),
    (8000.0, "8 kHz"),
    (16000.0, "16 kHz"),
];

pub struct ScopeApp {
    scan: DecayScan,
    texture: Option<egui::TextureHandle>,
    knobs: Vec<LabelledKnob>,

    //
    // Periodic progress logging.
    //
    last_stats_time: Instant,
}

impl ScopeApp {
    pub fn new(_cc: &eframe::CreationContext, engine: Box<dyn DspEngine>) -> Self {
        Self {
            scan: DecayScan::new(engine, IMAGE_WIDTH, IMAGE_HEIGHT),
            texture: None,
            knobs: vec![
                LabelledKnob::new(PARAM_WET_LEVEL, "Wet Level", "", 2, 0.0, 1.0, 0.5),
                LabelledKnob::new(PARAM_DECAY, "Decay", " s", 1, 0.1, 10.0, 2.0),
                LabelledKnob::new(PARAM_DAMPEN, "HF Damp", "", 2, 0.0, 0.99, 0.2),
            ],
            last_stats_time: Instant::now(),
        }
    }

    fn status_line(&self) -> String {
        if self.scan.column() >= self.scan.width() {
            "scan idle".to_string()
        } else {
            format!(
                "scanning {}/{} columns",
                self.scan.column(),
                self.scan.width()
            )
        }
    }

    /// Draws both label overlays, positioned with the exact mapping the
    /// analysis used for its rows and columns.
    fn draw_axis_labels(&self, painter: &egui::Painter, rect: egui::Rect) {
        let font = egui::FontId::proportional(11.0);
        let width = self.scan.width();
        let height = self.scan.height();

        for (seconds, label) in DECAY_MARKS {
            let column = self.scan.time_scale().position_of(seconds, width);
            let x = rect.min.x + rect.width() * column as f32 / width as f32;
            // The first mark sits on the left edge; nudge it inward.
            let x = if seconds <= MIN_SECONDS { x + 8.0 } else { x };
            painter.text(
                egui::pos2(x, rect.max.y - 8.0),
                egui::Align2::CENTER_CENTER,
                label,
                font.clone(),
                theme::LABEL_COLOR,
            );
        }

        for (freq, label) in FREQ_MARKS {
            let row = self.scan.freq_scale().position_of(freq, height);
            let y = rect.max.y - rect.height() * row as f32 / height as f32;
            painter.text(
                egui::pos2(rect.min.x + 4.0, y),
                egui::Align2::LEFT_CENTER,
                label,
                font.clone(),
                theme::LABEL_COLOR,
            );
        }
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        //
        // Advance the scan within its budget, then keep frames coming.
        //
        self.scan.tick(TICK_BUDGET);
        ctx.request_repaint();

        if self.last_stats_time.elapsed() > Duration::from_secs(1) {
            log::info!("{}", self.status_line());
            self.last_stats_time = Instant::now();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            theme::draw_menu_bar(ui, &self.status_line());
            ui.add_space(4.0);

            theme::draw_panel(ui, "Decay Spectrogram", |ui| {
                //
                // Re-upload the raster only when a column landed.
                //
                let size = [self.scan.width(), self.scan.height()];
                if self.scan.take_dirty() || self.texture.is_none() {
                    let image =
                        egui::ColorImage::from_rgba_unmultiplied(size, self.scan.raster());
                    if let Some(texture) = &mut self.texture {
                        texture.set(image, egui::TextureOptions::NEAREST);
                    } else {
                        self.texture = Some(ui.ctx().load_texture(
                            "spectrogram",
                            image,
                            egui::TextureOptions::NEAREST,
                        ));
                    }
                }

                //
                // Dark backdrop, then the alpha raster, then the labels.
                //
                if let Some(texture) = &self.texture {
                    let desired = egui::vec2(ui.available_width(), 300.0);
                    let (rect, _response) =
                        ui.allocate_exact_size(desired, egui::Sense::hover());

                    ui.painter().rect_filled(rect, 0.0, theme::SPECTROGRAM_BG);
                    ui.painter().image(
                        texture.id(),
                        rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                    self.draw_axis_labels(ui.painter(), rect);
                }
            });

            ui.add_space(6.0);

            theme::draw_panel(ui, "Reverb", |ui| {
                ui.horizontal(|ui| {
                    //
                    // A changed knob restarts the scan.
                    //
                    let mut changed: Option<(u32, f32)> = None;
                    for knob in &mut self.knobs {
                        if knob.show(ui) {
                            changed = Some((knob.param_index(), knob.value()));
                        }
                    }
                    if let Some((index, value)) = changed {
                        log::debug!("parameter {} -> {:.3}, restarting scan", index, value);
                        self.scan.set_parameter(index, value);
                    }
                });
            });
        });
    }
}
