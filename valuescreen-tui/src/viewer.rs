//! Interactive chart browser.
//!
//! ←/→ (or h/l) move the highlighted point in x order, Tab cycles chart
//! kinds, q/Esc quits. The status line shows the highlighted point's
//! identifier and its three values.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use valuescreen_core::chart::{scatter_points, ChartKind, ScatterPoint};
use valuescreen_core::table::WideTable;

use crate::scatter;
use crate::theme::Theme;

pub struct Viewer {
    table: WideTable,
    kind: ChartKind,
    /// Points of the current kind, sorted by x.
    points: Vec<ScatterPoint>,
    selected: usize,
    theme: Theme,
    should_quit: bool,
}

impl Viewer {
    pub fn new(table: WideTable, kind: ChartKind) -> Self {
        let mut viewer = Self {
            table,
            kind,
            points: Vec::new(),
            selected: 0,
            theme: Theme::default(),
            should_quit: false,
        };
        viewer.load_points();
        viewer
    }

    fn load_points(&mut self) {
        let mut points = scatter_points(&self.table, self.kind);
        points.sort_by(|a, b| a.x.total_cmp(&b.x));
        self.points = points;
        self.selected = 0;
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }

    pub fn points(&self) -> &[ScatterPoint] {
        &self.points
    }

    pub fn selected(&self) -> Option<&ScatterPoint> {
        self.points.get(self.selected)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn select_next(&mut self) {
        if !self.points.is_empty() {
            self.selected = (self.selected + 1) % self.points.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.points.is_empty() {
            self.selected = (self.selected + self.points.len() - 1) % self.points.len();
        }
    }

    pub fn next_kind(&mut self) {
        self.kind = self.kind.next();
        self.load_points();
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            KeyCode::Right | KeyCode::Char('l') => self.select_next(),
            KeyCode::Left | KeyCode::Char('h') => self.select_previous(),
            KeyCode::Tab => self.next_kind(),
            _ => {}
        }
    }

    /// Hover text for the highlighted point.
    pub fn hover_text(&self) -> String {
        match self.selected() {
            Some(p) => {
                let spec = self.kind.spec();
                format!(
                    "{}  {}: {:.2}  {}: {:.2}  {}: {:.2}  [{}/{}]",
                    p.identifier,
                    spec.x,
                    p.x,
                    spec.y,
                    p.y,
                    spec.size,
                    p.size,
                    self.selected + 1,
                    self.points.len()
                )
            }
            None => format!("no plottable rows for {}", self.kind),
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let [chart_area, hover_area, help_area] = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(f.area());

        self.draw_chart(f, chart_area);

        let hover_style = if self.points.is_empty() {
            self.theme.warning()
        } else {
            self.theme.highlight()
        };
        let hover = Paragraph::new(Line::from(Span::styled(self.hover_text(), hover_style)));
        f.render_widget(hover, hover_area);

        let help = Paragraph::new(Line::from(Span::styled(
            "←/→ select  Tab next chart  q quit",
            self.theme.muted(),
        )));
        f.render_widget(help, help_area);
    }

    fn draw_chart(&self, f: &mut Frame, area: Rect) {
        let selected = (!self.points.is_empty()).then_some(self.selected);
        scatter::render(
            f,
            area,
            &self.kind.spec(),
            &self.points,
            selected,
            &self.theme,
        );
    }
}

/// Event loop: draw, poll, dispatch until quit.
pub fn run_loop<B: Backend>(terminal: &mut Terminal<B>, viewer: &mut Viewer) -> Result<()> {
    while !viewer.should_quit() {
        terminal.draw(|f| viewer.draw(f))?;
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    viewer.handle_key(key);
                }
            }
        }
    }
    Ok(())
}

/// Take over the terminal and browse `table` until the user quits.
pub fn run_interactive(table: WideTable, kind: ChartKind) -> Result<()> {
    // Restore the terminal before a panic message is printed.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;

    let mut viewer = Viewer::new(table, kind);
    let result = run_loop(&mut terminal, &mut viewer);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use valuescreen_core::chart::{GROWTH_COLUMN, SIZE_COLUMN};
    use valuescreen_core::table::Column;

    fn table() -> WideTable {
        let mut t =
            WideTable::new(vec!["ADS.DE".into(), "AIR.PA".into(), "SAP.DE".into()]).unwrap();
        t.push_column(Column::float(
            GROWTH_COLUMN,
            vec![Some(12.0), Some(-3.0), Some(9.4)],
        ))
        .unwrap();
        t.push_column(Column::float(
            "Price/Sales (ttm)",
            vec![Some(2.1), Some(1.8), Some(7.77)],
        ))
        .unwrap();
        t.push_column(Column::float(
            SIZE_COLUMN,
            vec![Some(40.2), Some(25.0), Some(15.2)],
        ))
        .unwrap();
        t
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn points_are_ordered_by_x() {
        let viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        let ids: Vec<&str> = viewer
            .points()
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["AIR.PA", "SAP.DE", "ADS.DE"]);
    }

    #[test]
    fn arrows_move_selection_and_wrap() {
        let mut viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        viewer.handle_key(key(KeyCode::Right));
        assert_eq!(viewer.selected().unwrap().identifier, "SAP.DE");
        viewer.handle_key(key(KeyCode::Left));
        viewer.handle_key(key(KeyCode::Left));
        assert_eq!(viewer.selected().unwrap().identifier, "ADS.DE");
    }

    #[test]
    fn tab_cycles_kinds_and_empties_missing_columns() {
        let mut viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        viewer.handle_key(key(KeyCode::Tab));
        assert_eq!(viewer.kind(), ChartKind::DividendVsGrowthVsPe);
        assert!(viewer.points().is_empty());
        assert!(viewer.hover_text().starts_with("no plottable rows"));
    }

    #[test]
    fn quit_keys() {
        let mut viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        assert!(!viewer.should_quit());
        viewer.handle_key(key(KeyCode::Esc));
        assert!(viewer.should_quit());
    }

    #[test]
    fn draws_title_and_hover_line() {
        let viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| viewer.draw(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("vs. Price/Sales (ttm) vs. Trailing P/E"));
        assert!(text.contains("AIR.PA"));
        assert!(text.contains("q quit"));
    }

    #[test]
    fn empty_chart_notice_uses_warning_colour() {
        let mut viewer = Viewer::new(table(), ChartKind::RatioVsGrowthVsPe);
        viewer.next_kind();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| viewer.draw(f)).unwrap();

        let buffer = terminal.backend().buffer();
        // Hover line sits just above the help line.
        let cell = &buffer[(0, 18)];
        assert_eq!(cell.symbol(), "n");
        assert_eq!(cell.fg, Theme::default().warning);

        let inside_chart = &buffer[(50, 5)];
        assert_eq!(inside_chart.bg, Theme::default().background);
    }
}
