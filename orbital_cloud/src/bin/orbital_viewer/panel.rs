//! Control panel

use egui::{Color32, Context, RichText};
use orbital_cloud::{Component, Mode, Session};

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelAction {
    Redraw,
    Load,
    SelectOrbital(usize),
    SetComponent(Component),
    SetPointCount(usize),
    Stop,
}

/// Slider state that outlives a frame; the count is only applied on release.
pub struct PanelState {
    pub point_count: usize,
    pub message: Option<String>,
}

pub fn draw_control_panel(
    ctx: &Context,
    session: &Session,
    state: &mut PanelState,
) -> Vec<PanelAction> {
    let mut actions = Vec::new();

    egui::SidePanel::left("control_panel")
        .min_width(240.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading(RichText::new(session.title()).color(Color32::from_rgb(100, 200, 255)));
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if ui.button("Redraw").clicked() {
                    actions.push(PanelAction::Redraw);
                }
                if ui.add_enabled(session.is_running(), egui::Button::new("Stop")).clicked() {
                    actions.push(PanelAction::Stop);
                }
                if ui.button("Load…").clicked() {
                    actions.push(PanelAction::Load);
                }
            });
            ui.separator();

            let selected = session.selected();
            egui::ComboBox::from_label("Orbital")
                .selected_text(session.selected_choice().label.as_str())
                .show_ui(ui, |ui| {
                    for (i, choice) in session.choices().iter().enumerate() {
                        if ui.selectable_label(i == selected, choice.label.as_str()).clicked() {
                            actions.push(PanelAction::SelectOrbital(i));
                        }
                    }
                });

            if session.mode() == Mode::Wavefunction {
                let mut component = session.component();
                ui.horizontal(|ui| {
                    ui.radio_value(&mut component, Component::Real, "Re");
                    ui.radio_value(&mut component, Component::Imaginary, "Im");
                });
                if component != session.component() {
                    actions.push(PanelAction::SetComponent(component));
                }
            }

            let max = session.config().sampling.max_points;
            let slider = ui.add(egui::Slider::new(&mut state.point_count, 0..=max).text("points"));
            if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
                actions.push(PanelAction::SetPointCount(state.point_count));
            }

            ui.separator();
            let time = session
                .calculation_time()
                .map_or_else(|| "-".to_owned(), |t| format!("{:.2} s", t.as_secs_f64()));
            ui.label(format!("Calculation time: {time}"));
            ui.label(format!("CPU threads: {}", session.threads()));
            let shown = session.ready().map_or(0, |cloud| cloud.len());
            ui.label(format!("Points: {shown}"));
            if session.is_running() {
                ui.label(RichText::new("Sampling…").color(Color32::YELLOW));
            }
            if let Some(message) = &state.message {
                ui.label(RichText::new(message).color(Color32::LIGHT_RED));
            }
        });

    actions
}
