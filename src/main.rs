use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Clear, Dataset, Gauge, GraphType,
    Paragraph, Wrap,
};

use xg_terminal::chart_export::{self, ExportFormat};
use xg_terminal::config::AppConfig;
use xg_terminal::inputs::{Nudge, Param};
use xg_terminal::state::{AppState, ChartState, Focus, NoticeKind, Theme};

struct App {
    state: AppState,
    should_quit: bool,
}

impl App {
    fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.state.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.state.dismiss_notice();
            }
            return;
        }

        if self.state.help_overlay {
            if matches!(key.code, KeyCode::F(1) | KeyCode::Esc) {
                self.state.toggle_help();
            }
            return;
        }

        if self.state.export_dialog.is_some() {
            self.on_export_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('t') if ctrl => self.state.toggle_theme(),
            KeyCode::Char('e') if ctrl => {
                let _ = self.state.open_export();
            }
            KeyCode::Enter | KeyCode::F(5) => {
                let _ = self.state.analyze();
            }
            KeyCode::F(1) => self.state.toggle_help(),
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.state.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.state.focus_prev(),
            KeyCode::Left => self.state.nudge_focused(Nudge::Down),
            KeyCode::Right => self.state.nudge_focused(Nudge::Up),
            KeyCode::Backspace => self.state.backspace(),
            KeyCode::Char(c) if !ctrl => self.state.type_char(c),
            _ => {}
        }
    }

    fn on_export_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_export(),
            KeyCode::Enter => {
                // Outcome is already surfaced through the notice and the console.
                let _ = self.state.confirm_export();
            }
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(dialog) = self.state.export_dialog.as_mut() {
                    dialog.cycle_format();
                }
            }
            KeyCode::Backspace => {
                if let Some(dialog) = self.state.export_dialog.as_mut() {
                    dialog.filename.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(dialog) = self.state.export_dialog.as_mut() {
                    dialog.filename.push(c);
                }
            }
            _ => {}
        }
    }
}

fn main() -> io::Result<()> {
    let config = AppConfig::load();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
    bar: Color,
    highlight: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            bg: Color::Black,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            bar: Color::Gray,
            highlight: Color::Red,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            bg: Color::White,
            accent: Color::Blue,
            muted: Color::Gray,
            bar: Color::DarkGray,
            highlight: Color::Red,
        },
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let colors = palette(state.theme);
    let base = Style::default().fg(colors.fg).bg(colors.bg);
    frame.render_widget(Block::default().style(base), frame.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(state))
        .style(base)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_inputs(frame, chunks[1], state, colors);
    render_chart(frame, chunks[2], state.chart.as_ref(), colors);
    render_console(frame, chunks[3], state, colors);

    let footer = Paragraph::new(footer_text(state)).style(Style::default().fg(colors.muted));
    frame.render_widget(footer, chunks[4]);

    if state.export_dialog.is_some() {
        render_export_dialog(frame, frame.size(), state, colors);
    }
    if state.help_overlay {
        render_help_overlay(frame, frame.size(), colors);
    }
    if state.notice.is_some() {
        render_notice(frame, frame.size(), state, colors);
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!(
        "  .-.  xG GOAL PROBABILITY | Theme: {} | Export: {}",
        state.theme.label(),
        if state.chart.is_some() { "ready" } else { "analyze first" }
    );
    let line2 = " (   )".to_string();
    let line3 = "  '-'".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    if state.export_dialog.is_some() {
        return "Type filename | Tab Format | Enter Export | Esc Cancel".to_string();
    }
    "Tab/↑/↓ Row | ←/→ Slider | Enter/F5 Analyze | ^E Export | ^T Theme | F1 Help | Esc Quit"
        .to_string()
}

fn render_inputs(frame: &mut Frame, area: Rect, state: &AppState, colors: Palette) {
    let block = Block::default()
        .title("Inputs")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.muted));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(inner);

    for (row, param) in rows.iter().zip(Param::ALL) {
        let focused = state.focus.param() == Some(param);
        render_param_row(frame, *row, state, param, focused, colors);
    }

    let focused = state.focus == Focus::Player;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(14), Constraint::Min(1)])
        .split(rows[3]);
    render_cell_text(frame, cols[0], "Player Name", label_style(focused, colors));
    render_cell_text(
        frame,
        cols[1],
        &field_text(&state.player_label, focused),
        field_style(focused, colors),
    );
}

fn render_param_row(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    param: Param,
    focused: bool,
    colors: Palette,
) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Min(10),
            Constraint::Length(1),
            Constraint::Length(10),
        ])
        .split(area);

    let input = state.input(param);
    let spec = param.slider_spec();

    render_cell_text(frame, cols[0], param.label(), label_style(focused, colors));

    let fill = if focused { colors.accent } else { colors.bar };
    let gauge = Gauge::default()
        .ratio(spec.ratio(input.slider()))
        .label(param.format_value(input.slider()))
        .gauge_style(Style::default().fg(fill).bg(colors.muted));
    frame.render_widget(gauge, cols[1]);

    render_cell_text(
        frame,
        cols[3],
        &field_text(input.field(), focused),
        field_style(focused, colors),
    );
}

fn field_text(text: &str, focused: bool) -> String {
    if focused {
        format!("{text}▏")
    } else {
        text.to_string()
    }
}

fn label_style(focused: bool, colors: Palette) -> Style {
    if focused {
        Style::default().fg(colors.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors.fg)
    }
}

fn field_style(focused: bool, colors: Palette) -> Style {
    if focused {
        Style::default().fg(colors.bg).bg(colors.accent)
    } else {
        Style::default().fg(colors.fg).add_modifier(Modifier::UNDERLINED)
    }
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(Paragraph::new(text.to_string()).style(style), area);
}

fn render_chart(frame: &mut Frame, area: Rect, chart: Option<&ChartState>, colors: Palette) {
    let block = Block::default()
        .title("Goal distribution")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.muted));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(chart) = chart else {
        let empty = Paragraph::new("Analyze to see chart")
            .alignment(Alignment::Center)
            .style(Style::default().fg(colors.muted));
        let mid = Rect {
            y: inner.y + inner.height / 2,
            height: inner.height.min(1),
            ..inner
        };
        frame.render_widget(empty, mid);
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = Paragraph::new(chart.title.clone())
        .alignment(Alignment::Center)
        .style(Style::default().fg(colors.fg).add_modifier(Modifier::BOLD));
    frame.render_widget(title, sections[0]);

    let bar_count = chart.distribution.pmf.len().max(1) as u16;
    let bar_width = (sections[1].width / bar_count).saturating_sub(1).clamp(1, 7);
    frame.render_widget(pmf_bar_chart(chart, bar_width, colors), sections[1]);
    render_pmf_line(frame, sections[1], chart, bar_width, colors);

    let dist = &chart.distribution;
    let summary = format!(
        "p/shot {:.3} | shots {} | support 0..={}",
        dist.scoring_probability,
        dist.shot_count(),
        dist.max_goals
    );
    render_cell_text(frame, sections[2], &summary, Style::default().fg(colors.muted));
}

fn pmf_bar_chart(chart: &ChartState, bar_width: u16, colors: Palette) -> BarChart<'static> {
    let highlighted = chart.highlighted_index();
    let bars: Vec<Bar<'static>> = chart
        .bars()
        .map(|(goals, p)| {
            let color = if highlighted == Some(goals as usize) {
                colors.highlight
            } else {
                colors.bar
            };
            Bar::default()
                .value((p * 10_000.0).round() as u64)
                .text_value(format!("{:.1}", p * 100.0))
                .label(Line::from(goals.to_string()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(colors.bg).bg(color))
        })
        .collect();

    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .label_style(Style::default().fg(colors.fg))
}

/// Traces the PMF across the bar tops, one point per bar center.
fn render_pmf_line(
    frame: &mut Frame,
    area: Rect,
    chart: &ChartState,
    bar_width: u16,
    colors: Palette,
) {
    // Bars keep their bottom row for the goal labels.
    let plot = Rect {
        height: area.height.saturating_sub(1),
        ..area
    };
    let step = f64::from(bar_width + 1);
    let half = f64::from(bar_width) / 2.0;
    let points: Vec<(f64, f64)> = chart
        .bars()
        .map(|(goals, p)| (goals as f64 * step + half, p))
        .collect();
    let y_max = points
        .iter()
        .map(|&(_, p)| p)
        .fold(0.0_f64, f64::max)
        .max(f64::EPSILON);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(colors.accent))
        .data(&points);
    let line = Chart::new(vec![dataset])
        .x_axis(Axis::default().bounds([0.0, f64::from(plot.width)]))
        .y_axis(Axis::default().bounds([0.0, y_max]));
    frame.render_widget(line, plot);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState, colors: Palette) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(colors.muted))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_export_dialog(frame: &mut Frame, area: Rect, state: &AppState, colors: Palette) {
    let Some(dialog) = state.export_dialog.as_ref() else {
        return;
    };
    let popup_area = centered_rect(50, 30, area);
    frame.render_widget(Clear, popup_area);

    let formats = [ExportFormat::Png, ExportFormat::Pdf]
        .iter()
        .map(|f| {
            if *f == dialog.format {
                format!("[{}]", f.label())
            } else {
                format!(" {} ", f.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let target =
        chart_export::resolve_export_path(&state.export_dir, &dialog.filename, dialog.format);
    let text = [
        "Filename:".to_string(),
        format!("  {}▏", dialog.filename),
        String::new(),
        format!("Format:  {formats}"),
        format!("Target:  {}", target.display()),
    ]
    .join("\n");

    let popup = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(colors.fg).bg(colors.bg))
        .block(Block::default().title("Export Chart").borders(Borders::ALL));
    frame.render_widget(popup, popup_area);
}

fn render_notice(frame: &mut Frame, area: Rect, state: &AppState, colors: Palette) {
    let Some(notice) = state.notice.as_ref() else {
        return;
    };
    let popup_area = centered_rect(50, 20, area);
    frame.render_widget(Clear, popup_area);

    let border = match notice.kind {
        NoticeKind::Info => colors.accent,
        NoticeKind::Error => colors.highlight,
    };
    let text = format!("{}\n\nEnter/Esc to close", notice.body);
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(colors.fg).bg(colors.bg))
        .block(
            Block::default()
                .title(notice.title.clone())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        );
    frame.render_widget(popup, popup_area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, colors: Palette) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "xG Terminal - Help",
        "",
        "Inputs:",
        "  Tab / ↓      Next row (commits the field)",
        "  Shift-Tab/↑  Previous row (commits the field)",
        "  ← / →        Move the slider",
        "  type/Bksp    Edit the field",
        "",
        "Actions:",
        "  Enter / F5   Analyze",
        "  Ctrl-E       Export chart (PNG/PDF)",
        "  Ctrl-T       Toggle theme",
        "  F1           Toggle help",
        "  Esc / Ctrl-C Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default().fg(colors.fg).bg(colors.bg));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
