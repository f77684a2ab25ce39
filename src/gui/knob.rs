use super::theme;
use eframe::egui;

const KNOB_SIZE: f32 = 64.0;
const WIDGET_HEIGHT: f32 = 96.0;

// Rotation range: 300 degrees, pointer straight down at the extremes.
const SWEEP_DEGREES: f32 = 300.0;
const DRAG_RANGE_PIXELS: f32 = 150.0;

/// Rotary knob with a name label above and a value readout below.
pub struct LabelledKnob {
    param_index: u32,
    name: &'static str,
    unit: &'static str,
    decimals: usize,
    min: f32,
    max: f32,
    value: f32,
}

impl LabelledKnob {
    pub fn new(
        param_index: u32,
        name: &'static str,
        unit: &'static str,
        decimals: usize,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            param_index,
            name,
            unit,
            decimals,
            min,
            max,
            value: default.clamp(min, max),
        }
    }

    pub fn param_index(&self) -> u32 {
        self.param_index
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Draws the knob; returns true when dragging changed the value.
    pub fn show(&mut self, ui: &mut egui::Ui) -> bool {
        let (rect, response) = ui.allocate_exact_size(
            egui::vec2(KNOB_SIZE + 16.0, WIDGET_HEIGHT),
            egui::Sense::drag(),
        );

        //
        // Vertical drag adjusts the value.
        //
        let mut changed = false;
        if response.dragged() {
            let delta = -response.drag_delta().y / DRAG_RANGE_PIXELS;
            let next = (self.value + delta * (self.max - self.min)).clamp(self.min, self.max);
            if next != self.value {
                self.value = next;
                changed = true;
            }
        }

        let painter = ui.painter();

        //
        // Parameter name above the knob.
        //
        painter.text(
            egui::pos2(rect.center().x, rect.min.y + 7.0),
            egui::Align2::CENTER_CENTER,
            self.name,
            egui::FontId::proportional(13.0),
            theme::LABEL_COLOR,
        );

        //
        // Knob body and pointer.
        //
        let center = egui::pos2(rect.center().x, rect.min.y + 16.0 + KNOB_SIZE / 2.0);
        let radius = KNOB_SIZE / 2.0 - 4.0;

        painter.circle_filled(center, radius, egui::Color32::from_rgb(44, 48, 62));
        painter.circle_stroke(
            center,
            radius,
            egui::Stroke::new(
                1.5,
                if response.hovered() || response.dragged() {
                    theme::ACCENT
                } else {
                    theme::PANEL_EDGE
                },
            ),
        );

        let normalized = (self.value - self.min) / (self.max - self.min);
        let angle = (normalized - 0.5) * SWEEP_DEGREES.to_radians();
        let tip = egui::pos2(
            center.x + radius * angle.sin(),
            center.y - radius * angle.cos(),
        );
        painter.line_segment([center, tip], egui::Stroke::new(2.0, theme::ACCENT));

        //
        // Value readout below the knob.
        //
        painter.text(
            egui::pos2(rect.center().x, rect.max.y - 7.0),
            egui::Align2::CENTER_CENTER,
            format!("{:.*}{}", self.decimals, self.value, self.unit),
            egui::FontId::proportional(12.0),
            theme::LABEL_COLOR,
        );

        changed
    }
}
