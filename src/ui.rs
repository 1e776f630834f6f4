//! Layout and drawing: start screen, board, sidebar, pause and end-of-level overlays.

use crate::app::Screen;
use crate::game::{LEVELS_TO_WIN, Session};
use crate::theme::Theme;
use gemtui::{Cell, ClearTier, Grid, Special};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each gem is drawn three columns wide: `[◆]` when under the cursor, ` ◆ ` otherwise.
const CELL_WIDTH: u16 = 3;
const SIDEBAR_WIDTH: u16 = 26;

/// Fade-in of freshly dropped gems, in ms.
const FRESH_FADE_MS: u32 = 350;

/// One glyph per gem kind so colours are never the only cue.
const GEM_GLYPHS: [&str; 9] = ["◆", "●", "▲", "■", "◉", "♥", "✚", "♣", "♠"];
const BOMB_GLYPH: &str = "✸";

/// Fade effect over newly materialized gems; rebuilt whenever the session's fresh set changes.
#[derive(Default)]
pub struct FreshFade {
    effect: Option<Effect>,
    last_process: Option<Instant>,
    generation: u64,
}

fn gem_glyph(kind: u8) -> &'static str {
    GEM_GLYPHS[usize::from(kind.saturating_sub(1)) % GEM_GLYPHS.len()]
}

/// Board size in terminal cells, border included.
fn board_outer_size(grid: &Grid) -> (u16, u16) {
    (
        grid.width() as u16 * CELL_WIDTH + 2,
        grid.height() as u16 + 2,
    )
}

fn tier_color(tier: ClearTier) -> Color {
    match tier {
        ClearTier::Three => Color::Yellow,
        ClearTier::Four => Color::LightMagenta,
        ClearTier::FivePlus => Color::LightCyan,
    }
}

fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Draw the current screen, with the pause overlay when paused.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    session: &Session,
    theme: &Theme,
    paused: bool,
    no_animation: bool,
    fade: &mut FreshFade,
    now: Instant,
) {
    let area = frame.area();
    match screen {
        Screen::Start => draw_start(frame, theme, area),
        Screen::Playing => {
            let board_rect = draw_game(frame, session, theme, area);
            if !no_animation {
                apply_fresh_fade(frame, session, theme, board_rect, fade, now);
            }
            if paused {
                draw_overlay(
                    frame,
                    theme,
                    " Paused ",
                    Style::default().fg(Color::Black).bg(Color::Yellow),
                    vec![" P - Resume    Q - Quit ".to_string()],
                );
            }
        }
        Screen::LevelComplete => {
            draw_game(frame, session, theme, area);
            let bonus = session.bonus.map(|b| b.message()).unwrap_or_default();
            draw_overlay(
                frame,
                theme,
                &format!(" Level {} complete ", session.level),
                Style::default().fg(Color::Black).bg(Color::Green),
                vec![
                    format!(" {bonus} "),
                    format!(" Score: {} ", session.score()),
                    format!(" Next target: {} ", crate::game::level_target(session.level + 1)),
                    String::new(),
                    " Enter - Continue    Q - Quit ".to_string(),
                ],
            );
        }
        Screen::GameOver => {
            draw_game(frame, session, theme, area);
            draw_overlay(
                frame,
                theme,
                " Time's up! ",
                Style::default().fg(Color::White).bg(Color::Red),
                vec![
                    format!(" Score: {} / {} ", session.score(), session.target()),
                    format!(" Level: {} ", session.level),
                    String::new(),
                    " R - Restart    Q - Quit ".to_string(),
                ],
            );
        }
        Screen::Victory => {
            draw_game(frame, session, theme, area);
            draw_overlay(
                frame,
                theme,
                " You win! ",
                Style::default().fg(Color::Black).bg(theme.title),
                vec![
                    format!(" All {LEVELS_TO_WIN} levels cleared "),
                    format!(" Final score: {} ", session.score()),
                    String::new(),
                    " R - Play again    Q - Quit ".to_string(),
                ],
            );
        }
    }
}

fn draw_start(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 44u16;
    let popup_h = 16u16;
    let popup = centered(area, popup_w, popup_h);

    let gems: Vec<Span> = (1..=7u8)
        .flat_map(|k| {
            [
                Span::styled(gem_glyph(k), Style::default().fg(theme.gem_color(k)).bold()),
                Span::from(" "),
            ]
        })
        .collect();
    let key = |k: &'static str| Span::styled(k, Style::default().fg(theme.gem_color(4)));

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" gem ", Style::default().fg(theme.title).bold()),
            Span::styled("tui ", Style::default().fg(theme.main_fg).bold()),
        ]),
        Line::from(""),
        Line::from(gems),
        Line::from(""),
        Line::from(Span::styled(
            "Swap neighbours to line up three or more.",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            "T and L shapes leave a bomb behind.",
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(vec![
            key(" ←↑↓→/hjkl "),
            Span::from("MOVE  "),
            key(" ENTER "),
            Span::from("SELECT"),
        ]),
        Line::from(vec![key(" ESC "), Span::from("CANCEL  "), key(" P "), Span::from("PAUSE")]),
        Line::from(""),
        Line::from(Span::styled(
            " [ ENTER TO START ] ",
            Style::default().fg(Color::Black).bg(theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(" [Q] QUIT ", Style::default().fg(theme.inactive_fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_overlay(
    frame: &mut Frame,
    theme: &Theme,
    title: &str,
    title_style: Style,
    body: Vec<String>,
) {
    let popup_w = 34u16;
    let popup_h = body.len() as u16 + 5;
    let popup = centered(frame.area(), popup_w, popup_h);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(title.to_string(), title_style)),
        Line::from(""),
    ];
    lines.extend(
        body.into_iter()
            .map(|s| Line::from(Span::styled(s, Style::default().fg(theme.main_fg)))),
    );

    // Clear background
    for y in popup.y..popup.y + popup.height {
        for x in popup.x..popup.x + popup.width {
            frame.buffer_mut()[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(theme.bg));
        }
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

/// Board and sidebar centred in `area`. Returns the board's inner rect.
fn draw_game(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect) -> Rect {
    let grid = session.engine.grid();
    let (bw, bh) = board_outer_size(grid);
    let total_w = bw + SIDEBAR_WIDTH;
    let total_h = bh.max(sidebar_height(session.engine.config().gem_kinds));

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert_chunks[1]);

    let board_area = Rect {
        height: bh.min(inner[0].height),
        ..inner[0]
    };
    let board_rect = draw_board(frame, session, theme, board_area);
    draw_sidebar(frame, session, theme, inner[1]);
    board_rect
}

fn draw_board(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(
            format!(" Level {}  {} ", session.level, format_clock(session.time_left())),
            theme.title,
        ));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for ((x, y), cell) in session.engine.grid().iter() {
        let rx = inner.x + x as u16 * CELL_WIDTH;
        let ry = inner.y + y as u16;
        if rx + CELL_WIDTH > inner.x + inner.width || ry >= inner.y + inner.height {
            continue;
        }
        let bg = if session.selected == Some((x, y)) {
            theme.selected_bg
        } else {
            theme.bg
        };
        let (glyph, fg) = match cell {
            Cell::Empty => (" ", theme.bg),
            Cell::Gem(kind) => (gem_glyph(kind), theme.gem_color(kind)),
            Cell::Special(Special::Bomb) => (BOMB_GLYPH, theme.bomb),
        };
        let (left, right) = if session.cursor == (x, y) {
            ("[", "]")
        } else {
            (" ", " ")
        };
        let frame_style = Style::default().fg(theme.cursor).bg(bg).bold();
        buf[(rx, ry)].set_symbol(left).set_style(frame_style);
        buf[(rx + 1, ry)]
            .set_symbol(glyph)
            .set_style(Style::default().fg(fg).bg(bg).bold());
        buf[(rx + 2, ry)].set_symbol(right).set_style(frame_style);
    }

    // Floating score popups.
    for popup in &session.popups {
        let rx = inner.x + popup.x as u16 * CELL_WIDTH;
        let ry = inner.y + popup.y as u16;
        if rx < inner.x + inner.width && ry < inner.y + inner.height {
            let color = popup.tier.map_or(theme.main_fg, tier_color);
            let label = format!("+{}", popup.amount);
            let max_w = (inner.x + inner.width - rx) as usize;
            buf.set_stringn(rx, ry, label, max_w, Style::default().fg(color).bg(theme.bg).bold());
        }
    }

    Rect {
        width: (session.engine.grid().width() as u16 * CELL_WIDTH).min(inner.width),
        height: (session.engine.grid().height() as u16).min(inner.height),
        ..inner
    }
}

/// Buffer positions covered by the given board cells.
fn board_buffer_positions(board_rect: Rect, cells: &[gemtui::Pos]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &(gx, gy) in cells {
        let x0 = board_rect.x + gx as u16 * CELL_WIDTH;
        let y = board_rect.y + gy as u16;
        for x in x0..(x0 + CELL_WIDTH).min(board_rect.x + board_rect.width) {
            set.insert((x, y));
        }
    }
    set
}

/// Fade freshly dropped gems in from the background (TachyonFX).
fn apply_fresh_fade(
    frame: &mut Frame,
    session: &Session,
    theme: &Theme,
    board_rect: Rect,
    fade: &mut FreshFade,
    now: Instant,
) {
    if fade.generation != session.fresh_generation {
        fade.generation = session.fresh_generation;
        fade.last_process = None;
        let fresh = board_buffer_positions(board_rect, &session.fresh);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            fresh.contains(&(pos.x, pos.y))
        }));
        fade.effect = Some(
            fx::fade_from(theme.bg, theme.bg, (FRESH_FADE_MS, Interpolation::QuadOut))
                .with_filter(filter)
                .with_area(board_rect),
        );
    }

    let delta = fade
        .last_process
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    fade.last_process = Some(now);

    if let Some(effect) = &mut fade.effect {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
        if effect.done() {
            fade.effect = None;
        }
    }
}

/// Stats, gauge, one row per gem kind, last clear.
fn sidebar_height(gem_kinds: u8) -> u16 {
    6 + 3 + (u16::from(gem_kinds) + 2) + 3
}

fn draw_sidebar(frame: &mut Frame, session: &Session, theme: &Theme, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let kinds = session.engine.config().gem_kinds as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),         // Score, target, level, time
            Constraint::Length(3),         // Progress gauge
            Constraint::Length(kinds + 2), // Per-kind counts
            Constraint::Length(3),         // Last clear
        ])
        .split(Rect {
            x: area.x + 1,
            width: area.width.saturating_sub(1),
            ..area
        });

    // --- Stats ---
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let time_left = session.time_left();
    let time_style = if time_left < Duration::from_secs(15) {
        Style::default().fg(Color::Red).bold()
    } else {
        fg_style
    };
    let stats_lines = vec![
        row("Score:  ", session.score().to_string()),
        row("Target: ", session.target().to_string()),
        row("Level:  ", format!("{} / {LEVELS_TO_WIN}", session.level)),
        Line::from(vec![
            Span::styled("Time:   ", title_style),
            Span::styled(format_clock(time_left), time_style),
        ]),
    ];
    Paragraph::new(stats_lines).render(stats_inner, frame.buffer_mut());

    // --- Progress to target ---
    let ratio = (f64::from(session.score()) / f64::from(session.target().max(1))).min(1.0);
    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0))
        .gauge_style(Style::default().fg(theme.gem_color(1)).bg(theme.bg))
        .render(chunks[1], frame.buffer_mut());

    // --- Gems removed, per kind ---
    let gems_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(" Gems ", title_style));
    let gems_inner = gems_block.inner(chunks[2]);
    gems_block.render(chunks[2], frame.buffer_mut());
    let gem_lines: Vec<Line> = session
        .engine
        .score()
        .removed_by_kind()
        .map(|(kind, n)| {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", gem_glyph(kind)),
                    Style::default().fg(theme.gem_color(kind)).bold(),
                ),
                Span::styled(n.to_string(), fg_style),
            ])
        })
        .collect();
    Paragraph::new(gem_lines).render(gems_inner, frame.buffer_mut());

    // --- Last clear ---
    let last_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let last_inner = last_block.inner(chunks[3]);
    last_block.render(chunks[3], frame.buffer_mut());
    let last = match session.last_tier {
        Some(tier) => Span::styled(tier.label(), Style::default().fg(tier_color(tier)).bold()),
        None => Span::styled("-", Style::default().fg(theme.inactive_fg)),
    };
    Paragraph::new(Line::from(vec![Span::styled("Last: ", title_style), last]))
        .render(last_inner, frame.buffer_mut());
}
