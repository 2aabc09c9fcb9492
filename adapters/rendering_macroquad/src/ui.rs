//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter can
//! remain agnostic of Macroquad's UI types.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use robot_replay_rendering::{ControlInput, PanelView};

/// Label of the pause toggle while playback is paused.
pub(crate) const PLAY_LABEL: &str = "|>";
/// Label of the pause toggle while playback is running.
pub(crate) const STOP_LABEL: &str = "[]";

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext<'a> {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Size of the widget window in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// State reported by playback after the previous frame.
    pub view: &'a PanelView,
}

/// Widget values that persist across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct ControlPanelWidgets {
    /// Position of the speed slider.
    pub speed_offset: f32,
    /// State of the arrows checkbox.
    pub show_arrows: bool,
}

/// Returns the label shown on the pause toggle.
pub(crate) fn pause_label(paused: bool) -> &'static str {
    if paused {
        PLAY_LABEL
    } else {
        STOP_LABEL
    }
}

/// Renders the control panel widgets and returns the controls they triggered.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext<'_>,
    widgets: &mut ControlPanelWidgets,
) -> Vec<ControlInput> {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .color_selected(Color::from_rgba(70, 70, 70, 255))
        .color_selected_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_inactive(Color::from_rgba(56, 56, 56, 200))
        .margin(RectOffset::new(8.0, 8.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut controls = Vec::new();
    let view = context.view;
    let range = view.speed_range.max(1.0);
    let previous = *widgets;
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        if ui.button(None, pause_label(view.paused)) {
            controls.push(ControlInput::TogglePause);
        }
        ui.same_line(0.0);
        if ui.button(None, "<<") {
            controls.push(ControlInput::Restart);
        }
        ui.same_line(0.0);
        if ui.button(None, "<") {
            controls.push(ControlInput::StepBackward);
        }
        ui.same_line(0.0);
        if ui.button(None, ">") {
            controls.push(ControlInput::StepForward);
        }

        ui.slider(hash!("speed"), "Speed", -range..range, &mut widgets.speed_offset);
        ui.checkbox(hash!("arrows"), "Show Arrows", &mut widgets.show_arrows);
        ui.label(None, "Left/Right: step, Space: pause");
    });

    ui.pop_skin();

    if (widgets.speed_offset - previous.speed_offset).abs() > f32::EPSILON {
        controls.push(ControlInput::SetSpeedOffset(widgets.speed_offset));
    }
    if widgets.show_arrows != previous.show_arrows {
        controls.push(ControlInput::SetShowArrows(widgets.show_arrows));
    }
    controls
}
