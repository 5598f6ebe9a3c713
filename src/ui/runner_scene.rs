//! Poop Runner terminal rendering.
//!
//! Uses the cell buffer approach: terrain, entities and the runner are
//! projected from world units onto a character grid, the screen effects
//! (inversion, darkening, flash) are applied to the grid, and the grid is
//! stamped row by row.

use super::game_common::{
    create_game_layout, render_cell_buffer, render_info_panel_frame, render_status_bar, Cell,
};
use crate::leaderboard::LeaderboardEntry;
use crate::runner::controller::{LeaderboardSource, RunController};
use crate::runner::effects::EffectKind;
use crate::runner::entities::{CollectibleKind, EntityKind, PowerUpKind};
use crate::runner::geometry::Rect as WorldRect;
use crate::runner::score::RunResult;
use crate::runner::state::SimulationState;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SKY: Color = Color::Rgb(24, 28, 48);
const DIRT: Color = Color::Rgb(70, 52, 36);
const DIRT_FG: Color = Color::Rgb(96, 74, 52);
const GRASS: Color = Color::Rgb(90, 160, 70);
const BONUS: Color = Color::Rgb(230, 190, 60);
const RUNNER: Color = Color::Rgb(250, 230, 120);
const FIREBALL: Color = Color::Rgb(240, 90, 40);
const POOP: Color = Color::Rgb(150, 100, 50);
const INVERTER: Color = Color::Rgb(200, 90, 220);
const POWER_UP: Color = Color::Rgb(80, 210, 230);

const GROUND_TOP: char = '▀';
const GROUND_FILL: char = '▓';

/// Render the whole scene for the controller's current state.
pub fn render_runner_scene(frame: &mut Frame, area: Rect, controller: &RunController) {
    if let Some(result) = controller.result() {
        render_result(frame, area, controller, result);
        return;
    }

    let layout = create_game_layout(frame, area, " Poop Runner ", Color::LightYellow, 12, 24);
    let state = controller.state();

    let mut buffer = build_field(state, layout.content.width, layout.content.height);
    apply_screen_effects(&mut buffer, state);
    render_cell_buffer(frame, layout.content, &buffer);

    if state.run.waiting_to_start {
        render_start_prompt(frame, layout.content);
    }
    render_status(frame, layout.status_bar, state);
    render_info_panel(frame, layout.info_panel, state);
}

/// Grid cells covered by a world rectangle, clipped to the grid.
fn cell_span(
    rect: &WorldRect,
    sx: f64,
    sy: f64,
    cols: usize,
    rows: usize,
) -> Option<(usize, usize, usize, usize)> {
    let c0 = (rect.x * sx).floor();
    let c1 = (rect.right() * sx).ceil() - 1.0;
    let r0 = (rect.y * sy).floor();
    let r1 = (rect.bottom() * sy).ceil() - 1.0;
    let c1 = c1.max(c0);
    let r1 = r1.max(r0);
    if c1 < 0.0 || r1 < 0.0 || c0 >= cols as f64 || r0 >= rows as f64 {
        return None;
    }
    Some((
        c0.max(0.0) as usize,
        (c1 as usize).min(cols - 1),
        r0.max(0.0) as usize,
        (r1 as usize).min(rows - 1),
    ))
}

fn fill(buffer: &mut [Vec<Cell>], rect: &WorldRect, sx: f64, sy: f64, ch: char, fg: Color) {
    let rows = buffer.len();
    let cols = buffer.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return;
    }
    if let Some((c0, c1, r0, r1)) = cell_span(rect, sx, sy, cols, rows) {
        for row in &mut buffer[r0..=r1] {
            for cell in &mut row[c0..=c1] {
                cell.ch = ch;
                cell.fg = fg;
            }
        }
    }
}

fn glyph(kind: &EntityKind) -> (char, Color) {
    match kind {
        EntityKind::Hazard(_) => ('@', FIREBALL),
        EntityKind::Collectible(CollectibleKind::Normal { bonus: false }) => ('●', POOP),
        EntityKind::Collectible(CollectibleKind::Normal { bonus: true }) => ('●', BONUS),
        // Indistinguishable from the real thing
        EntityKind::Collectible(CollectibleKind::Decoy) => ('●', POOP),
        EntityKind::Collectible(CollectibleKind::Inverter) => ('↻', INVERTER),
        EntityKind::PowerUp(PowerUpKind::SizeBoost) => ('S', POWER_UP),
        EntityKind::PowerUp(PowerUpKind::JumpBoost) => ('J', POWER_UP),
    }
}

/// Project the world onto a `cols x rows` grid, upright and undimmed.
pub(crate) fn build_field(state: &SimulationState, cols: u16, rows: u16) -> Vec<Vec<Cell>> {
    let (cols, rows) = (cols as usize, rows as usize);
    let sky = Cell {
        ch: ' ',
        fg: SKY,
        bg: SKY,
    };
    let mut buffer = vec![vec![sky; cols]; rows];
    if cols == 0 || rows == 0 {
        return buffer;
    }
    let viewport = &state.config.viewport;
    let sx = cols as f64 / viewport.width;
    let sy = rows as f64 / viewport.height;

    for col in 0..cols {
        let world_x = (col as f64 + 0.5) / sx;
        let ground = state.terrain.height_at(world_x);
        if ground.is_gap {
            continue;
        }
        let top = ((ground.ground_y * sy).floor().max(0.0) as usize).min(rows - 1);
        let surface = if ground.bonus { BONUS } else { GRASS };
        buffer[top][col] = Cell {
            ch: GROUND_TOP,
            fg: surface,
            bg: DIRT,
        };
        for row in buffer.iter_mut().skip(top + 1) {
            row[col] = Cell {
                ch: GROUND_FILL,
                fg: DIRT_FG,
                bg: DIRT,
            };
        }
    }

    for entity in &state.entities {
        let (ch, fg) = glyph(&entity.kind);
        fill(&mut buffer, &entity.bounds, sx, sy, ch, fg);
    }
    fill(&mut buffer, &state.player.bounds(), sx, sy, '█', RUNNER);
    buffer
}

fn scale(color: Color, factor: f64) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
            Color::Rgb(f(r), f(g), f(b))
        }
        other => other,
    }
}

fn toward_white(color: Color, alpha: f64) -> Color {
    match color {
        Color::Rgb(r, g, b) => {
            let f = |c: u8| {
                (c as f64 + (255.0 - c as f64) * alpha)
                    .round()
                    .clamp(0.0, 255.0) as u8
            };
            Color::Rgb(f(r), f(g), f(b))
        }
        other => other,
    }
}

/// World inversion flips the grid; the decoy debuff darkens it; the
/// inversion flash washes it towards white.
pub(crate) fn apply_screen_effects(buffer: &mut [Vec<Cell>], state: &SimulationState) {
    let effects = &state.effects;
    if effects.is_inverted() {
        buffer.reverse();
    }

    let opacity = effects.debuff_opacity();
    let flash = effects.flash_alpha();
    if opacity <= 0.0 && flash <= 0.0 {
        return;
    }
    for cell in buffer.iter_mut().flatten() {
        if opacity > 0.0 {
            cell.fg = scale(cell.fg, 1.0 - opacity);
            cell.bg = scale(cell.bg, 1.0 - opacity);
        }
        if flash > 0.0 {
            cell.fg = toward_white(cell.fg, flash);
            cell.bg = toward_white(cell.bg, flash);
        }
    }
}

fn render_start_prompt(frame: &mut Frame, area: Rect) {
    if area.height < 5 || area.width < 20 {
        return;
    }
    let prompt = "[ Press Space/Up to Start ]";
    let width = (prompt.chars().count() as u16).min(area.width);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let line = Paragraph::new(Line::from(Span::styled(
        prompt,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));
    frame.render_widget(line, Rect::new(x, area.y + area.height / 3, width, 1));
}

fn render_status(frame: &mut Frame, area: Rect, state: &SimulationState) {
    if state.run.waiting_to_start {
        render_status_bar(
            frame,
            area,
            "Ready",
            Color::LightYellow,
            &[("[Space/Up]", "Start"), ("[Esc]", "Quit")],
        );
        return;
    }
    let status = if state.effects.is_inverted() {
        "Upside down!"
    } else {
        "Run!"
    };
    render_status_bar(
        frame,
        area,
        status,
        Color::LightYellow,
        &[("[Space/Up]", "Jump"), ("[Esc]", "Quit")],
    );
}

fn effect_line(label: &str, seconds: f64, color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {:<10}", label), Style::default().fg(color)),
        Span::styled(format!("{:>4.1}s", seconds), Style::default().fg(Color::White)),
    ])
}

fn render_info_panel(frame: &mut Frame, area: Rect, state: &SimulationState) {
    let inner = render_info_panel_frame(frame, area);
    let player = &state.player;
    let run = &state.run;

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Poop: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                run.collected.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Time: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:.1}s", run.elapsed.as_secs_f64()),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Jumps: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(
                    "{}/{}",
                    player.max_jumps.saturating_sub(player.used_jumps),
                    player.max_jumps
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Gaps: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:.0}%", run.gap_probability * 100.0),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Effects:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let effects = &state.effects;
    let active = [
        (EffectKind::SizeBoost, "Big", POWER_UP),
        (EffectKind::JumpBoost, "Spring", POWER_UP),
        (EffectKind::InvertWorld, "Inverted", INVERTER),
        (EffectKind::VisibilityDebuff, "Stinky", POOP),
    ];
    let mut any = false;
    for (kind, label, color) in active {
        if effects.is_active(kind) {
            any = true;
            lines.push(effect_line(label, effects.remaining(kind).as_secs_f64(), color));
        }
    }
    if !any {
        lines.push(Line::from(Span::styled(" none", Style::default().fg(Color::DarkGray))));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Legend:",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));
    for (ch, color, text) in [
        ('█', RUNNER, "You"),
        ('●', POOP, "Poop (+1)"),
        ('●', BONUS, "Golden (+2)"),
        ('@', FIREBALL, "Fireball"),
        ('↻', INVERTER, "Reverse"),
        ('S', POWER_UP, "Size boost"),
        ('J', POWER_UP, "Jump boost"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", ch), Style::default().fg(color)),
            Span::styled(text, Style::default().fg(Color::DarkGray)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Index of the entry that is this run's own submission.
pub(crate) fn own_entry(entries: &[LeaderboardEntry], result: &RunResult) -> Option<usize> {
    entries.iter().position(|entry| {
        entry.name == result.display_name && (entry.score - f64::from(result.score)).abs() < 0.5
    })
}

fn render_result(frame: &mut Frame, area: Rect, controller: &RunController, result: &RunResult) {
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(" Result ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightYellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled(
            result.reason.describe(),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("{} {}", result.score, result.mode.unit()),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
            Span::styled(
                format!("Rank {}", result.rank.grade),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(result.rank.label, Style::default().fg(Color::Cyan))),
        Line::from(""),
    ];

    match controller.leaderboard_view() {
        None => lines.push(Line::from(Span::styled(
            "Fetching ranking...",
            Style::default().fg(Color::DarkGray),
        ))),
        Some(view) => {
            let heading = match view.source {
                LeaderboardSource::Global => "World ranking",
                LeaderboardSource::LocalCache => "Your best runs",
            };
            lines.push(Line::from(Span::styled(
                heading,
                Style::default().fg(Color::Yellow),
            )));
            let own = own_entry(&view.entries, result);
            for (i, entry) in view.entries.iter().take(3).enumerate() {
                let style = if own == Some(i) {
                    Style::default()
                        .fg(Color::LightYellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                lines.push(Line::from(Span::styled(
                    format!("{}. {:<18} {:>5} {}", i + 1, entry.name, entry.score, entry.rank),
                    style,
                )));
            }
            if view.entries.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No scores yet",
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[R/Enter] Run again  [Esc] Quit",
        Style::default().fg(Color::DarkGray),
    )));

    let height = (lines.len() as u16).min(inner.height);
    let y = inner.y + inner.height.saturating_sub(height) / 2;
    let text = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(text, Rect::new(inner.x, y, inner.width, height));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfig;
    use crate::runner::score::{evaluate_rank, ScoringMode};
    use crate::runner::state::RunEnd;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::time::Duration;

    fn state() -> SimulationState {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        SimulationState::new(RunnerConfig::default(), &mut rng)
    }

    fn runner_rows(buffer: &[Vec<Cell>]) -> Vec<usize> {
        buffer
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|c| c.ch == '█' && c.fg == RUNNER))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_runner_drawn_in_lower_half() {
        let s = state();
        let buffer = build_field(&s, 80, 30);
        assert_eq!(buffer.len(), 30);
        assert_eq!(buffer[0].len(), 80);
        let rows = runner_rows(&buffer);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|&r| r >= 15));
    }

    #[test]
    fn test_inversion_flips_rows() {
        let mut s = state();
        s.effects.trigger(EffectKind::InvertWorld);
        s.effects.tick(Duration::from_millis(200));
        assert!(s.effects.is_inverted());
        let mut buffer = build_field(&s, 80, 30);
        apply_screen_effects(&mut buffer, &s);
        let rows = runner_rows(&buffer);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|&r| r < 15));
    }

    #[test]
    fn test_debuff_darkens_cells() {
        let mut s = state();
        let mut plain = build_field(&s, 40, 20);
        apply_screen_effects(&mut plain, &s);
        s.effects.trigger(EffectKind::VisibilityDebuff);
        let mut dark = build_field(&s, 40, 20);
        apply_screen_effects(&mut dark, &s);
        assert_eq!(plain[0][0].bg, SKY);
        assert_ne!(dark[0][0].bg, SKY);
        let (Color::Rgb(r0, _, _), Color::Rgb(r1, _, _)) = (plain[0][0].bg, dark[0][0].bg) else {
            panic!("expected rgb colors");
        };
        assert!(r1 < r0);
    }

    #[test]
    fn test_own_entry_highlight() {
        let mut run = crate::runner::state::RunState::new(0.3);
        run.collected = 42;
        let result = RunResult::evaluate(ScoringMode::Collected, &run, RunEnd::HazardHit, "kei#JP");
        assert_eq!(result.rank, evaluate_rank(ScoringMode::Collected, 42));
        let entry = |name: &str, score: f64| LeaderboardEntry {
            name: name.to_string(),
            score,
            rank: "B".to_string(),
            label: String::new(),
            avatar_data_url: None,
            created_at: 0,
        };
        let entries = vec![entry("ann", 80.0), entry("kei#JP", 42.0), entry("bob", 12.0)];
        assert_eq!(own_entry(&entries, &result), Some(1));
        assert_eq!(own_entry(&entries[..1], &result), None);
    }
}
