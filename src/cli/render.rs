use std::fmt::Write;

use ansi_term::Colour;

use crate::{
    contributions::{CalendarDayCell, ContributionLevel, ViewWindow},
    dashboard::PanelSnapshot,
};

const CELL: &str = "■";

/// Arranges cells into printable rows. Week and month read left to right, the year reads top to
/// bottom so every column is a run of 7 days.
pub fn layout(cells: &[CalendarDayCell], window: ViewWindow) -> Vec<Vec<&CalendarDayCell>> {
    match window {
        ViewWindow::Week | ViewWindow::Month => cells
            .chunks(window.columns())
            .map(|row| row.iter().collect::<Vec<_>>())
            .collect(),
        ViewWindow::Year => {
            let mut rows: Vec<Vec<&CalendarDayCell>> = vec![vec![]; 7];
            for column in cells.chunks(7) {
                for (row, cell) in rows.iter_mut().zip(column) {
                    row.push(cell);
                }
            }
            rows.retain(|row| !row.is_empty());
            rows
        }
    }
}

fn colour(level: ContributionLevel) -> Colour {
    match level {
        ContributionLevel::None => Colour::RGB(0x1f, 0x29, 0x37),
        ContributionLevel::Low => Colour::RGB(0x14, 0x53, 0x2d),
        ContributionLevel::Medium => Colour::RGB(0x15, 0x80, 0x3d),
        ContributionLevel::High => Colour::RGB(0x22, 0xc5, 0x5e),
    }
}

fn symbol(level: ContributionLevel) -> char {
    match level {
        ContributionLevel::None => '.',
        ContributionLevel::Low => '-',
        ContributionLevel::Medium => '+',
        ContributionLevel::High => '#',
    }
}

fn paint(level: ContributionLevel, color: bool) -> String {
    if color {
        colour(level).paint(CELL).to_string()
    } else {
        symbol(level).to_string()
    }
}

/// Draws a whole panel: title, grid, legend, total and the covered period.
pub fn render_snapshot(snapshot: &PanelSnapshot, color: bool) -> String {
    let mut out = String::new();
    // Writing into a String can't fail.
    let _ = writeln!(out, "{}", snapshot.kind.title());
    for row in layout(&snapshot.cells, snapshot.view) {
        let line = row
            .iter()
            .map(|cell| paint(cell.level(), color))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{line}");
    }
    let legend = [
        ContributionLevel::None,
        ContributionLevel::Low,
        ContributionLevel::Medium,
        ContributionLevel::High,
    ]
    .map(|level| paint(level, color))
    .join(" ");
    let _ = writeln!(out, "Less {legend} More");
    let _ = writeln!(out, "{}", snapshot.summary());
    let _ = writeln!(out, "{}", snapshot.caption());
    out
}

/// One line per active day, newest last. Used when colors are off and the grid alone hides dates.
pub fn render_active_days(snapshot: &PanelSnapshot) -> String {
    snapshot
        .cells
        .iter()
        .filter(|cell| cell.count > 0)
        .map(|cell| format!("{}\n", cell.describe()))
        .collect()
}
