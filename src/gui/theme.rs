use eframe::egui;

pub const PANEL_BG: egui::Color32 = egui::Color32::from_rgb(24, 26, 34);
pub const PANEL_EDGE: egui::Color32 = egui::Color32::from_rgb(70, 76, 94);
pub const SPECTROGRAM_BG: egui::Color32 = egui::Color32::from_rgb(16, 24, 48);
pub const LABEL_COLOR: egui::Color32 = egui::Color32::from_rgb(190, 200, 220);
pub const ACCENT: egui::Color32 = egui::Color32::from_rgb(120, 170, 255);

pub fn setup_global_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    //
    // Dark panel fills throughout.
    //
    style.visuals.panel_fill = PANEL_BG;
    style.visuals.window_fill = PANEL_BG;
    style.visuals.override_text_color = Some(LABEL_COLOR);

    //
    // Remove widget rounding to match the plugin aesthetic.
    //
    style.visuals.widgets.noninteractive.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.active.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.inactive.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.hovered.rounding = egui::Rounding::ZERO;

    ctx.set_style(style);
}

/// Draws a simplified menu bar with a right-aligned status label.
pub fn draw_menu_bar(ui: &mut egui::Ui, status: &str) {
    egui::TopBottomPanel::top("menubar").show_inside(ui, |ui| {
        ui.visuals_mut().widgets.noninteractive.bg_fill = PANEL_BG;
        ui.horizontal(|ui| {
            //
            // Application title.
            //
            ui.label(egui::RichText::new("reverbscope").strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                //
                // Scan/backend status label.
                //
                ui.label(egui::RichText::new(status).italics().size(10.0));
            });
        });
    });
}

/// Draws a titled frame with a bevel border around `content`.
pub fn draw_panel<F: FnOnce(&mut egui::Ui)>(ui: &mut egui::Ui, title: &str, content: F) {
    let frame = egui::Frame::none()
        .fill(PANEL_BG)
        .stroke(egui::Stroke::new(1.0, PANEL_EDGE))
        .inner_margin(2.0);

    frame.show(ui, |ui| {
        //
        // Title bar region.
        //
        let title_height = 18.0;
        let (rect, _response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), title_height),
            egui::Sense::hover(),
        );

        ui.painter()
            .rect_filled(rect, 0.0, egui::Color32::from_rgb(38, 42, 56));
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            title,
            egui::FontId::proportional(14.0),
            LABEL_COLOR,
        );

        //
        // Content region.
        //
        ui.add_space(4.0);
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.0, PANEL_EDGE))
            .inner_margin(6.0)
            .show(ui, content);
    });
}
