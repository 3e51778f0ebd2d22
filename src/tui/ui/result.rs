//! Evaluation progress and result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::domain::{AssessmentReport, Evaluation, RemotePrediction, RiskAssessment, Strategy};
use crate::tui::styles::ClinicalTheme;

/// Result pane state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    /// Worker running; progress is cosmetic
    Evaluating { strategy: Strategy, progress: f64 },
    Complete { report: AssessmentReport },
    /// Evaluation failed; shown as a dismissable notice
    Failed { message: String },
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0], state);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Evaluating { strategy, progress } => {
            render_progress(f, chunks[1], *strategy, *progress)
        }
        ResultState::Complete { report } => match &report.evaluation {
            Evaluation::Local(assessment) => render_local(f, chunks[1], assessment),
            Evaluation::Remote(prediction) => render_remote(f, chunks[1], prediction),
        },
        ResultState::Failed { message } => render_failure(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect, state: &ResultState) {
    let subtitle = match state {
        ResultState::Complete { report } => format!(
            " │ {} result at {}",
            report.evaluation.strategy(),
            report.evaluated_at.format("%H:%M:%S UTC")
        ),
        ResultState::Evaluating { strategy, .. } => format!(" │ Running {strategy} evaluation"),
        _ => String::new(),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Risk Assessment", ClinicalTheme::title()),
        Span::styled(subtitle, ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assessment yet",
            ClinicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, strategy: Strategy, progress: f64) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .margin(2)
        .split(area);

    let description = match strategy {
        Strategy::Local => "Scoring observation locally...",
        Strategy::Remote => "Waiting for the prediction service...",
    };

    let stage_text = Paragraph::new(Line::from(vec![
        Span::styled("Strategy: ", ClinicalTheme::text_secondary()),
        Span::styled(strategy.to_string(), ClinicalTheme::focused()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stage_text, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ClinicalTheme::border()),
        )
        .gauge_style(ClinicalTheme::info())
        .ratio(progress.clamp(0.0, 1.0))
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, chunks[1]);

    let desc = Paragraph::new(Line::from(Span::styled(
        description,
        ClinicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(desc, chunks[2]);
}

fn prediction_line(positive: bool) -> Line<'static> {
    let text = if positive {
        "Heart disease indicated"
    } else {
        "No heart disease indicated"
    };
    Line::from(vec![
        Span::styled("Prediction: ", ClinicalTheme::text_secondary()),
        Span::styled(
            text,
            ClinicalTheme::prediction(positive).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_local(f: &mut Frame, area: Rect, assessment: &RiskAssessment) {
    let block = Block::default()
        .title(Span::styled(" Heuristic Assessment ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tier
            Constraint::Length(3), // Score gauge
            Constraint::Length(2), // Prediction
            Constraint::Min(0),    // Factors
        ])
        .margin(1)
        .split(inner);

    let tier_style = ClinicalTheme::risk_tier(assessment.tier);
    let tier_display = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{} Risk", assessment.tier),
            tier_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            assessment.tier.description(),
            ClinicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(tier_display, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Risk Score ", ClinicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(ClinicalTheme::border()),
        )
        .gauge_style(tier_style)
        .percent(u16::from(assessment.score))
        .label(format!("{} / 100", assessment.score));
    f.render_widget(gauge, chunks[1]);

    f.render_widget(
        Paragraph::new(prediction_line(assessment.prediction)).alignment(Alignment::Center),
        chunks[2],
    );

    let items: Vec<ListItem> = if assessment.factors.is_empty() {
        vec![ListItem::new(Span::styled(
            "No notable risk factors",
            ClinicalTheme::text_muted(),
        ))]
    } else {
        assessment
            .factors
            .iter()
            .map(|factor| {
                ListItem::new(Line::from(vec![
                    Span::styled("• ", tier_style),
                    Span::styled(factor.label(), ClinicalTheme::text()),
                ]))
            })
            .collect()
    };
    let factors = List::new(items).block(
        Block::default()
            .title(Span::styled(" Key Factors ", ClinicalTheme::text_secondary()))
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(factors, chunks[3]);
}

fn render_remote(f: &mut Frame, area: Rect, prediction: &RemotePrediction) {
    let block = Block::default()
        .title(Span::styled(" Remote Prediction ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Prediction
            Constraint::Length(3), // Confidence
            Constraint::Min(0),    // Message
        ])
        .margin(1)
        .split(inner);

    f.render_widget(
        Paragraph::new(prediction_line(prediction.is_positive())).alignment(Alignment::Center),
        chunks[0],
    );

    match prediction.confidence {
        Some(confidence) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(" Confidence ", ClinicalTheme::text_secondary()))
                        .borders(Borders::ALL)
                        .border_style(ClinicalTheme::border()),
                )
                .gauge_style(ClinicalTheme::prediction(prediction.is_positive()))
                .ratio(confidence.clamp(0.0, 1.0))
                .label(format!("{:.1}%", confidence * 100.0));
            f.render_widget(gauge, chunks[1]);
        }
        None => {
            f.render_widget(
                Paragraph::new(Span::styled(
                    "Confidence not reported",
                    ClinicalTheme::text_muted(),
                ))
                .alignment(Alignment::Center),
                chunks[1],
            );
        }
    }

    if let Some(message) = &prediction.message {
        let msg = Paragraph::new(Line::from(Span::styled(
            message.as_str(),
            ClinicalTheme::text_secondary(),
        )))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        f.render_widget(msg, chunks[2]);
    }
}

fn render_failure(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "! Connection Error",
            ClinicalTheme::danger().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, ClinicalTheme::text())),
        Line::from(""),
        Line::from(Span::styled(
            "Your entries are kept. Switch to local scoring with [M] or try again.",
            ClinicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[R] ", ClinicalTheme::key_hint()),
            Span::styled("New Assessment ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Edit Values", ClinicalTheme::key_desc()),
        ]),
        ResultState::Failed { .. } | ResultState::Idle => Line::from(vec![
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Back to Form", ClinicalTheme::key_desc()),
        ]),
        ResultState::Evaluating { .. } => Line::from(vec![Span::styled(
            "Processing...",
            ClinicalTheme::text_muted(),
        )]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
