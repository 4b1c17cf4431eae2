//! UI rendering for the TUI.

use cryptosentinel_core::format::{abbreviate_address, format_relative_time};
use cryptosentinel_core::{Decision, FollowupAnswer, MetricView, Phase, Severity};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Border color for the address form
const BORDER_INPUT: Color = Color::Rgb(0, 150, 150);
/// Border color for the metrics panel
const BORDER_METRICS: Color = Color::Rgb(80, 160, 80);
/// Border color for the recommendation/follow-up panel
const BORDER_DETAILS: Color = Color::Rgb(180, 100, 180);
/// Label color for metric names and field labels
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Unfilled part of a gauge
const GAUGE_TRACK: Color = Color::Rgb(40, 40, 40);

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header, body, notice, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(5),    // Body
        Constraint::Length(1), // Notice
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    match app.session.phase() {
        Phase::Input => render_input_view(frame, app, chunks[1]),
        Phase::Loading => render_loading_view(frame, app, chunks[1]),
        Phase::Summary => render_summary_view(frame, app, chunks[1]),
        Phase::ProcessingDecision => render_processing_view(frame, app, chunks[1]),
        Phase::Result => render_result_view(frame, app, chunks[1]),
        Phase::AnalysisFailed => render_failed_view(frame, app, chunks[1]),
    }
    render_notice(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

/// Render the header with the product name and current token.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "CryptoSentinel",
        Style::default().fg(Color::Cyan).bold(),
    )];
    if let Some(address) = app.session.address() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            abbreviate_address(address),
            Style::default().fg(Color::White),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Center a box of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn spinner(animation_frame: u64) -> char {
    SPINNER[(animation_frame as usize) % SPINNER.len()]
}

// ========== Input ==========

fn render_input_view(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Enter a token contract address or name to analyze",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::styled(app.input.clone(), Style::default().fg(Color::White).bold()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
    ];

    let form = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_INPUT))
            .title(" Analyze Token ")
            .title_style(Style::default().fg(BORDER_INPUT).bold()),
    );
    frame.render_widget(form, centered(area, 72, 7));
}

// ========== Busy screens ==========

fn render_loading_view(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            format!("{} {}", spinner(app.animation_frame), app.loader_message()),
            Style::default().fg(Color::Cyan).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            app.session.address().unwrap_or_default().to_string(),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let loader = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(loader, centered(area, area.width, 3));
}

fn render_processing_view(frame: &mut Frame, app: &App, area: Rect) {
    let dots = ".".repeat(((app.animation_frame / 5) % 4) as usize);
    let verb = match app.session.decision() {
        Some(Decision::Yes) => "Submitting your trade",
        _ => "Processing your decision",
    };
    let line = Line::from(Span::styled(
        format!("{}{:<3}", verb, dots),
        Style::default().fg(Color::Yellow).bold(),
    ));
    let processing = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(processing, centered(area, area.width, 1));
}

// ========== Summary ==========

fn render_summary_view(frame: &mut Frame, app: &App, area: Rect) {
    let Some(summary) = app.summary.as_ref() else {
        return;
    };

    // Layout: metrics, details, prompt
    let chunks = Layout::vertical([
        Constraint::Length(summary.metrics.len() as u16 * 2 + 2), // Metrics
        Constraint::Min(4),                                        // Details
        Constraint::Length(3),                                     // Prompt
    ])
    .split(area);

    render_metrics_panel(frame, &summary.metrics, chunks[0]);
    render_details_panel(frame, app, chunks[1]);
    render_prompt(frame, app, chunks[2]);
}

/// One label row and one gauge row per metric.
fn render_metrics_panel(frame: &mut Frame, metrics: &[MetricView], area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_METRICS))
        .title(" Metrics ")
        .title_style(Style::default().fg(BORDER_METRICS).bold());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical(metrics.iter().map(|_| Constraint::Length(2))).split(inner);
    for (metric, row) in metrics.iter().zip(rows.iter()) {
        let [label_area, gauge_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(*row);
        let color = severity_color(metric.severity);

        let mut label = vec![
            Span::styled(
                format!("{:<20}", metric.label()),
                Style::default().fg(LABEL_COLOR),
            ),
            Span::styled(
                format!("{:>10}", metric.score_text()),
                Style::default().fg(color).bold(),
            ),
        ];
        if let Some(comment) = &metric.comment {
            label.push(Span::raw("  "));
            label.push(Span::styled(
                comment.clone(),
                Style::default().fg(Color::DarkGray),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(label)), label_area);

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color).bg(GAUGE_TRACK))
            .ratio(gauge_ratio(metric.fill_fraction))
            .label(Span::styled(
                metric.severity.as_str(),
                Style::default().fg(Color::White).bold(),
            ));
        frame.render_widget(gauge, gauge_area);
    }
}

/// Recommendation, timestamp, partial-data errors and follow-ups.
fn render_details_panel(frame: &mut Frame, app: &App, area: Rect) {
    let Some(summary) = app.summary.as_ref() else {
        return;
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Recommendation: ", Style::default().fg(LABEL_COLOR)),
        Span::styled(
            summary.final_recommendation.clone(),
            Style::default().fg(Color::White).bold(),
        ),
    ])];

    let mut analyzed = vec![
        Span::styled("Analyzed: ", Style::default().fg(LABEL_COLOR)),
        Span::raw(summary.analyzed_at.clone()),
    ];
    if let Some(analysis) = app.session.analysis() {
        analyzed.push(Span::styled(
            format!(" ({})", format_relative_time(analysis.result.timestamp)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines.push(Line::from(analyzed));

    for metric in summary.errors() {
        lines.push(Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!("{}: ", metric.label()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(metric.error.clone().unwrap_or_default()),
        ]));
    }

    for entry in app.session.followups() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Q: ", Style::default().fg(Color::Cyan).bold()),
            Span::raw(entry.question.clone()),
        ]));
        let answer = match &entry.answer {
            FollowupAnswer::Pending => Span::styled(
                format!("{} thinking...", spinner(app.animation_frame)),
                Style::default().fg(Color::DarkGray),
            ),
            FollowupAnswer::Answered(text) => Span::raw(text.clone()),
            FollowupAnswer::Failed(reason) => {
                Span::styled(reason.clone(), Style::default().fg(Color::Red))
            }
        };
        lines.push(Line::from(vec![
            Span::styled("A: ", Style::default().fg(Color::Green).bold()),
            answer,
        ]));
    }

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_DETAILS))
                .title(" Details ")
                .title_style(Style::default().fg(BORDER_DETAILS).bold()),
        );
    frame.render_widget(details, area);
}

/// Buy prompt, or the follow-up question being typed.
fn render_prompt(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(question) = &app.followup_input {
        Line::from(vec![
            Span::styled("Ask: ", Style::default().fg(Color::Cyan).bold()),
            Span::raw(question.clone()),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    } else if app.session.can_decide() {
        Line::from(vec![
            Span::styled(
                "Would you like to buy this token? ",
                Style::default().fg(Color::White).bold(),
            ),
            Span::styled("[y]", Style::default().fg(Color::Green).bold()),
            Span::raw(" yes  "),
            Span::styled("[n]", Style::default().fg(Color::Red).bold()),
            Span::raw(" no"),
        ])
    } else if app.session.is_busy() {
        Line::from(Span::styled(
            "Waiting for the follow-up answer...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            "No trade is offered for this analysis.",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let prompt = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(prompt, area);
}

// ========== Outcomes ==========

fn render_result_view(frame: &mut Frame, app: &App, area: Rect) {
    let (title, color) = match app.session.decision() {
        Some(Decision::Yes) => (" Trade ", Color::Green),
        _ => (" Result ", BORDER_INPUT),
    };
    let outcome = app.session.decision_outcome().unwrap_or_default().to_string();

    let result = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(outcome, Style::default().fg(Color::White).bold())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(color))
            .title(title)
            .title_style(Style::default().fg(color).bold()),
    );
    frame.render_widget(result, centered(area, 72, 6));
}

fn render_failed_view(frame: &mut Frame, app: &App, area: Rect) {
    let reason = app.session.analysis_error().unwrap_or_default().to_string();
    let failed = Paragraph::new(vec![
        Line::from(Span::styled(
            "The analysis could not be completed.",
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(reason, Style::default().fg(Color::Red))),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Red))
            .title(" Analysis Failed ")
            .title_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(failed, centered(area, 72, 8));
}

// ========== Footer ==========

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(notice) = &app.notice {
        let line = Line::from(Span::styled(
            format!(" {}", notice),
            Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
        ));
        frame.render_widget(Paragraph::new(line), area);
    }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keys: &[(&str, &str)] = match app.session.phase() {
        Phase::Input => &[("Enter", "analyze"), ("Esc", "quit")],
        Phase::Loading | Phase::ProcessingDecision => &[("q", "quit")],
        Phase::Summary if app.followup_input.is_some() => &[("Enter", "ask"), ("Esc", "cancel")],
        Phase::Summary => &[
            ("y/n", "decide"),
            ("f", "follow-up"),
            ("j/k", "scroll"),
            ("q", "quit"),
        ],
        Phase::Result => &[("r", "start over"), ("q", "quit")],
        Phase::AnalysisFailed => &[("Enter", "retry"), ("r", "start over"), ("q", "quit")],
    };

    let mut spans = Vec::new();
    for (i, (key, action)) in keys.iter().enumerate() {
        let key = if i == 0 {
            format!(" {}", key)
        } else {
            key.to_string()
        };
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}  ", action)));
    }
    spans.push(Span::raw("│ "));
    spans.push(Span::styled(
        format!("session {}", app.session.token()),
        Style::default().fg(Color::DarkGray),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Gauge color for a severity band.
fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::Warning => Color::Rgb(255, 140, 0),
        Severity::Caution => Color::Yellow,
        Severity::Good => Color::Green,
    }
}

/// `Gauge` only accepts ratios within 0..=1.
fn gauge_ratio(fill_fraction: f64) -> f64 {
    if fill_fraction.is_nan() {
        0.0
    } else {
        fill_fraction.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_ratio_clamps_out_of_range_values() {
        assert_eq!(gauge_ratio(1.2), 1.0);
        assert_eq!(gauge_ratio(-0.1), 0.0);
        assert_eq!(gauge_ratio(0.45), 0.45);
        assert_eq!(gauge_ratio(f64::NAN), 0.0);
    }

    #[test]
    fn test_severity_colors_are_distinct() {
        let colors = [
            severity_color(Severity::Critical),
            severity_color(Severity::Warning),
            severity_color(Severity::Caution),
            severity_color(Severity::Good),
        ];
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_centered_fits_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let inner = centered(area, 72, 6);
        assert_eq!(inner.width, 40);
        assert_eq!(inner.height, 6);
        assert_eq!(inner.y, 2);
    }
}
