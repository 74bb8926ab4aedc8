//! Card showing the predicted digit

use egui::{Color32, RichText, Rounding, Vec2};

use crate::dashboard::theme::ThemeColors;
use crate::shared::{DisplayState, Phase};

/// Shown before the first stroke is classified
const PLACEHOLDER: &str = "Draw a number";

/// Status shown by the card's indicator dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardStatus {
    Waiting,
    Busy,
    Done,
    Error,
}

impl CardStatus {
    pub fn from_display(display: &DisplayState) -> Self {
        match display.phase {
            Phase::Classifying => CardStatus::Busy,
            _ if display.result.is_error() => CardStatus::Error,
            _ if display.result.label.is_empty() => CardStatus::Waiting,
            _ => CardStatus::Done,
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            CardStatus::Waiting => ThemeColors::TEXT_MUTED,
            CardStatus::Busy => ThemeColors::ACCENT_WARNING,
            CardStatus::Done => ThemeColors::ACCENT_SUCCESS,
            CardStatus::Error => ThemeColors::ACCENT_ERROR,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CardStatus::Waiting => "Waiting",
            CardStatus::Busy => "Classifying...",
            CardStatus::Done => "Prediction",
            CardStatus::Error => "Failed",
        }
    }
}

/// Render the prediction card
pub fn result_card(ui: &mut egui::Ui, display: &DisplayState) {
    let status = CardStatus::from_display(display);
    let (label, size) = if display.result.label.is_empty() {
        (PLACEHOLDER, 28.0)
    } else {
        (display.result.label.as_str(), 64.0)
    };

    egui::Frame::none()
        .fill(ThemeColors::BG_MEDIUM)
        .rounding(Rounding::same(8.0))
        .inner_margin(16.0)
        .show(ui, |ui| {
            ui.set_min_width(180.0);

            ui.horizontal(|ui| {
                let dot = ui.cursor().left_top() + Vec2::new(6.0, 10.0);
                ui.painter().circle_filled(dot, 4.0, status.color());
                ui.add_space(16.0);
                ui.label(RichText::new(status.label()).size(12.0).color(status.color()));
            });

            ui.add_space(4.0);
            ui.label(
                RichText::new(label)
                    .size(size)
                    .color(ThemeColors::TEXT_PRIMARY)
                    .strong(),
            );

            if let Some(confidence) = display.result.confidence {
                ui.label(
                    RichText::new(format!("{:.0}% confidence", confidence * 100.0))
                        .size(12.0)
                        .color(ThemeColors::TEXT_SECONDARY),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::DisplayResult;

    #[test]
    fn test_card_status_from_display() {
        let mut display = DisplayState::default();
        assert_eq!(CardStatus::from_display(&display), CardStatus::Waiting);

        display.phase = Phase::Classifying;
        assert_eq!(CardStatus::from_display(&display), CardStatus::Busy);

        display.phase = Phase::Displaying;
        display.set_result(DisplayResult::error_message("boom"));
        assert_eq!(CardStatus::from_display(&display), CardStatus::Error);

        display.set_result(DisplayResult {
            label: "4".to_string(),
            ..Default::default()
        });
        assert_eq!(CardStatus::from_display(&display), CardStatus::Done);
    }
}
