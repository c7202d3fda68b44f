pub mod charting;
pub mod report;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use nourish::aggregate::{compute_streak, windowed_trend};
use nourish::calendar::CalendarMonth;
use nourish::time_series::{mood_series, urge_series, TrendOverview};
use nourish::timer::TimerStatus;
use nourish::util::format_clock;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let timer = &self.timer;
        let state = timer.state();
        let phase = timer.current_phase();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let accent = Style::default().fg(Color::Green);

        let prompt = timer.prompt().unwrap_or_default();
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_lines = ((prompt.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),            // context
                Constraint::Min(1),               // padding
                Constraint::Length(1),            // phase
                Constraint::Length(1),            // clock
                Constraint::Length(1),            // gauge
                Constraint::Length(1),            // padding
                Constraint::Length(prompt_lines), // prompt
                Constraint::Min(1),               // padding
                Constraint::Length(1),            // status
                Constraint::Length(1),            // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(self.title.as_str(), dim_style))
            .alignment(Alignment::Left)
            .render(chunks[0], buf);

        Paragraph::new(Line::from(vec![
            Span::styled(phase.label.as_str(), bold_style),
            Span::styled(format!(" ({} min)", phase.minutes), dim_style),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

        let clock_style = match state.status {
            TimerStatus::Running => bold_style.patch(accent),
            TimerStatus::Completed => bold_style.fg(Color::Cyan),
            TimerStatus::Cancelled => dim_style,
            _ => bold_style,
        };
        Paragraph::new(Span::styled(
            format!("{} remaining", timer.remaining_clock()),
            clock_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        Gauge::default()
            .gauge_style(accent)
            .ratio(timer.phase_progress().clamp(0.0, 1.0))
            .label("")
            .render(chunks[4], buf);

        Paragraph::new(Span::styled(prompt, italic_style))
            .alignment(if prompt_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[6], buf);

        let status = match self.finished_secs() {
            Some(total) => format!("finished · total {}", format_clock(total)),
            None => format!(
                "Phase {}/{} · elapsed {} · {}",
                state.phase_index + 1,
                timer.phases().len(),
                format_clock(state.total_elapsed_secs),
                state.status.to_string().to_lowercase()
            ),
        };
        Paragraph::new(Span::styled(status, dim_style))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);

        let legend = if state.is_running() {
            "(space) pause  (s)kip  (tab) progress  (q)uit"
        } else {
            "(space) start  (s)kip  (r)eset  (+/-) minutes  (tab) progress  (q)uit"
        };
        Paragraph::new(Span::styled(legend, italic_style))
            .alignment(Alignment::Center)
            .render(chunks[9], buf);
    }
}

pub fn render_progress(app: &App, f: &mut Frame) {
    let area = f.area();
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // tiles
            Constraint::Min(10),   // calendar + chart
            Constraint::Length(1), // legend
        ])
        .split(area);

    let points = windowed_trend(&app.records, app.trend_window);
    let overview = TrendOverview::from_points(&points);
    let streak = compute_streak(&app.records, app.today);

    let tiles = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(chunks[0]);
    let tile = |title: String, value: String| {
        Paragraph::new(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title))
    };
    f.render_widget(
        tile(
            "Current streak".into(),
            format!("{} day{}", streak, if streak == 1 { "" } else { "s" }),
        ),
        tiles[0],
    );
    f.render_widget(
        tile(
            format!("Mood avg ({}d)", app.trend_window),
            report::format_avg(overview.mood_avg),
        ),
        tiles[1],
    );
    f.render_widget(
        tile(
            format!("Urge avg ({}d)", app.trend_window),
            report::format_avg(overview.urge_avg),
        ),
        tiles[2],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(chunks[1]);

    let (year, month) = app.view_month;
    let calendar_text = match CalendarMonth::build(year, month, &app.records) {
        Ok(cal) => report::render_calendar(&cal, &app.thresholds, Some(app.today)),
        Err(e) => e.to_string(),
    };
    f.render_widget(
        Paragraph::new(calendar_text).block(Block::default().borders(Borders::ALL).title("Calendar")),
        body[0],
    );

    let mood = charting::to_tuples(&mood_series(&points));
    let urge = charting::to_tuples(&urge_series(&points));
    let x_bound = charting::compute_x_bound(points.len());
    let datasets = vec![
        Dataset::default()
            .name("mood")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Green))
            .graph_type(GraphType::Line)
            .data(&mood),
        Dataset::default()
            .name("urge")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&urge),
    ];
    let first = points.first().map(|p| p.date.format("%m/%d").to_string());
    let last = points.last().map(|p| p.date.format("%m/%d").to_string());
    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Mood & urge, last {} active days", app.trend_window)),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_bound])
                .labels(first.into_iter().chain(last).map(Span::raw).collect::<Vec<_>>())
                .style(dim_style),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, charting::SCORE_MAX])
                .labels(
                    [0.0, charting::SCORE_MAX]
                        .into_iter()
                        .map(|v| Span::raw(charting::format_label(v)))
                        .collect::<Vec<_>>(),
                )
                .style(dim_style),
        );
    f.render_widget(chart, body[1]);

    let legend = if app.invalid_records > 0 {
        format!(
            "{} invalid records skipped  (←/→) month  (w) window  (tab) timer  (q)uit",
            app.invalid_records
        )
    } else {
        "(←/→) month  (w) window 7/14/30  (tab) timer  (q)uit".to_string()
    };
    f.render_widget(
        Paragraph::new(Span::styled(legend, dim_style.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center),
        chunks[2],
    );
}
