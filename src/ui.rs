//! Terminal widget tree mirroring the bridge.
//!
//! [`TuiPresenter`] is the concrete render capability: the reconciler writes
//! presentation fields into it and the draw loop reads a snapshot back out.
//! The engine itself never depends on this module; swapping in a
//! [`crate::reconcile::NullPresenter`] leaves it fully functional.
use std::sync::{Arc, Mutex};

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::endpoint::LampTriple;
use crate::reconcile::{
    LightGroup, Presenter, StateColor, DISTANCE_PLACEHOLDER, TIMER_PLACEHOLDER,
};

/// Snapshot of every presentation field the widgets draw from.
#[derive(Debug, Clone)]
pub struct MirrorFields {
    pub state_label: String,
    pub state_color: StateColor,
    pub distance_a: String,
    pub distance_b: String,
    pub road_lamps: LampTriple,
    pub vessel_lamps: LampTriple,
    pub road_timer: String,
    pub vessel_timer: String,
    pub mode_label: String,
    pub controls_enabled: bool,
    pub command_status: String,
}

impl Default for MirrorFields {
    fn default() -> Self {
        Self {
            state_label: "IDLE".to_string(),
            state_color: StateColor::Neutral,
            distance_a: DISTANCE_PLACEHOLDER.to_string(),
            distance_b: DISTANCE_PLACEHOLDER.to_string(),
            road_lamps: LampTriple::default(),
            vessel_lamps: LampTriple::default(),
            road_timer: TIMER_PLACEHOLDER.to_string(),
            vessel_timer: TIMER_PLACEHOLDER.to_string(),
            mode_label: "Automatic".to_string(),
            controls_enabled: false,
            command_status: String::new(),
        }
    }
}

/// Presenter backed by a shared field snapshot for the draw loop.
#[derive(Clone, Default)]
pub struct TuiPresenter {
    fields: Arc<Mutex<MirrorFields>>,
}

impl TuiPresenter {
    pub fn snapshot(&self) -> MirrorFields {
        self.fields.lock().unwrap().clone()
    }
}

impl Presenter for TuiPresenter {
    fn bridge_state(&self, label: &str, color: StateColor) {
        let mut fields = self.fields.lock().unwrap();
        fields.state_label = label.to_string();
        fields.state_color = color;
    }

    fn distances(&self, a: &str, b: &str) {
        let mut fields = self.fields.lock().unwrap();
        fields.distance_a = a.to_string();
        fields.distance_b = b.to_string();
    }

    fn lamps(&self, group: LightGroup, lamps: LampTriple) {
        let mut fields = self.fields.lock().unwrap();
        match group {
            LightGroup::Road => fields.road_lamps = lamps,
            LightGroup::Vessel => fields.vessel_lamps = lamps,
        }
    }

    fn timer(&self, group: LightGroup, text: &str) {
        let mut fields = self.fields.lock().unwrap();
        match group {
            LightGroup::Road => fields.road_timer = text.to_string(),
            LightGroup::Vessel => fields.vessel_timer = text.to_string(),
        }
    }

    fn mode(&self, label: &str, controls_enabled: bool) {
        let mut fields = self.fields.lock().unwrap();
        fields.mode_label = label.to_string();
        fields.controls_enabled = controls_enabled;
    }

    fn command_status(&self, text: &str) {
        self.fields.lock().unwrap().command_status = text.to_string();
    }
}

fn state_style(color: StateColor) -> Style {
    match color {
        StateColor::Green => Style::default().fg(Color::Green),
        StateColor::Red => Style::default().fg(Color::Red),
        StateColor::Amber => Style::default().fg(Color::Yellow),
        StateColor::Neutral => Style::default().fg(Color::Gray),
    }
}

fn lamp_line(on: bool, name: &str, color: Color) -> Line<'_> {
    let (symbol, style) = if on {
        ("\u{25cf}", Style::default().fg(color))
    } else {
        ("\u{25cb}", Style::default().fg(Color::DarkGray))
    };
    Line::from(vec![
        Span::styled(symbol, style),
        Span::raw(" "),
        Span::raw(name),
    ])
}

fn render_lamp_column(
    title: &str,
    lamps: LampTriple,
    timer: &str,
    area: Rect,
    buf: &mut Buffer,
) {
    let lines = vec![
        lamp_line(lamps.red, "red", Color::Red),
        lamp_line(lamps.yellow, "yellow", Color::Yellow),
        lamp_line(lamps.green, "green", Color::Green),
        Line::from(format!("Timer: {}", timer)),
    ];

    Paragraph::new(Text::from(lines))
        .block(
            Block::bordered()
                .title(title.to_string())
                .border_type(BorderType::Rounded),
        )
        .render(area, buf);
}

/// Draw the whole mirror into `area`.
pub fn render_mirror(fields: &MirrorFields, area: Rect, buf: &mut Buffer) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Bridge card
            Constraint::Length(6), // Lamp columns
            Constraint::Length(4), // Proximity sensors
            Constraint::Min(1),    // Command status + key hints
        ])
        .split(area);

    let controls_note = if fields.controls_enabled {
        "Controls enabled (Manual mode)"
    } else {
        "Controls locked (Automatic mode)"
    };
    let bridge_lines = vec![
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(fields.state_label.clone(), state_style(fields.state_color)),
        ]),
        Line::from(format!("Mode: {}", fields.mode_label)),
        Line::from(controls_note),
    ];
    Paragraph::new(Text::from(bridge_lines))
        .block(
            Block::bordered()
                .title("Bridge Lift")
                .border_type(BorderType::Rounded),
        )
        .render(layout[0], buf);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);
    render_lamp_column("Road Signal", fields.road_lamps, &fields.road_timer, columns[0], buf);
    render_lamp_column(
        "Vessel Signal",
        fields.vessel_lamps,
        &fields.vessel_timer,
        columns[1],
        buf,
    );

    let distance_lines = vec![
        Line::from(format!("Sensor A: {}", fields.distance_a)),
        Line::from(format!("Sensor B: {}", fields.distance_b)),
    ];
    Paragraph::new(Text::from(distance_lines))
        .block(
            Block::bordered()
                .title("Proximity")
                .border_type(BorderType::Rounded),
        )
        .render(layout[2], buf);

    let hints = "[m] mode  [o] open  [c] close  [s] stop  [q] quit";
    let footer = vec![
        Line::from(fields.command_status.clone()),
        Line::from(Span::styled(hints, Style::default().fg(Color::DarkGray))),
    ];
    Paragraph::new(Text::from(footer)).render(layout[3], buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presenter_snapshot_reflects_updates() {
        let presenter = TuiPresenter::default();
        presenter.bridge_state("OPENING", StateColor::Green);
        presenter.distances("12.3 cm", "--");
        presenter.timer(LightGroup::Road, "2.5s");
        presenter.mode("Manual", true);

        let fields = presenter.snapshot();
        assert_eq!(fields.state_label, "OPENING");
        assert_eq!(fields.state_color, StateColor::Green);
        assert_eq!(fields.distance_a, "12.3 cm");
        assert_eq!(fields.distance_b, "--");
        assert_eq!(fields.road_timer, "2.5s");
        assert_eq!(fields.vessel_timer, TIMER_PLACEHOLDER);
        assert!(fields.controls_enabled);
    }

    #[test]
    fn test_render_mirror_fits_small_area() {
        let fields = MirrorFields::default();
        let area = Rect::new(0, 0, 60, 18);
        let mut buf = Buffer::empty(area);
        render_mirror(&fields, area, &mut buf);

        let rendered = format!("{:?}", buf);
        assert!(rendered.contains("Bridge Lift"));
    }
}
