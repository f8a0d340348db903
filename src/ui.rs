use crate::app::Overlay;
use crate::model::{MAX_VOLUME, Volume};
use crate::player::Player;
use crate::session::PlaybackSession;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

const LOGO: &[&str] = &[
    "  __ _ _ __ ___  _ __ (_)_ __ ___ ",
    " / _` | '_ ` _ \\| '_ \\| | '__/ _ \\",
    "| (_| | | | | | | |_) | | | |  __/",
    " \\__,_|_| |_| |_| .__/|_|_|  \\___|",
    "                |_|              ",
];
const NOW_PLAYING: &str = "-=-=- Now Playing -=-=";
const PAUSED: &str = "-=-=- PAUSED -=-=";
const SPINNER: &[&str] = &["|", "/", "-", "\\"];
const EQUALIZER: &[&str] = &["|   ", "||  ", "||| ", "||||"];
const FRAME_MS: u64 = 200;
const HISTORY_ROWS: usize = 5;
const VOLUME_BLOCKS: usize = 12;

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
    popup_bg: Color,
}

fn palette() -> Palette {
    Palette {
        bg: Color::Rgb(12, 10, 18),
        panel_bg: Color::Rgb(24, 19, 34),
        border: Color::Rgb(140, 60, 84),
        text: Color::Rgb(236, 226, 240),
        muted: Color::Rgb(150, 136, 164),
        accent: Color::Rgb(232, 82, 110),
        alert: Color::Rgb(249, 174, 88),
        selected_bg: Color::Rgb(62, 30, 46),
        popup_bg: Color::Rgb(30, 22, 40),
    }
}

fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
        .split(vertical[0]);
    (body[0], body[1], vertical[1])
}

pub fn song_list_rows(area: Rect) -> usize {
    let (list, _, _) = layout(area);
    usize::from(list.height.saturating_sub(2)).max(1)
}

pub fn draw(frame: &mut Frame, player: &Player, overlay: Option<&Overlay>) {
    let colors = palette();
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let (list_area, info_area, status_area) = layout(frame.area());
    let tick = player.now() / FRAME_MS;
    let session = player.registry().active();

    draw_song_list(frame, list_area, session, tick, &colors);
    draw_info(frame, info_area, player, tick, &colors);

    let status = player
        .notice()
        .map(|notice| {
            if notice.body.is_empty() {
                notice.title.clone()
            } else {
                format!("{}: {}", notice.title, notice.body)
            }
        })
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(status, Style::default().fg(colors.muted))),
        status_area,
    );

    if let Some(overlay) = overlay {
        draw_overlay(frame, overlay, &colors);
    }
}

fn draw_song_list(
    frame: &mut Frame,
    area: Rect,
    session: Option<&PlaybackSession>,
    tick: u64,
    colors: &Palette,
) {
    let Some(session) = session else {
        frame.render_widget(
            Paragraph::new("No Music! Pass a directory on the command line.")
                .style(Style::default().fg(colors.muted))
                .block(panel_block("Songs", colors.panel_bg, colors.text, colors.border)),
            area,
        );
        return;
    };

    let range = session.visible_range();
    let spinner = SPINNER[(tick % SPINNER.len() as u64) as usize];
    let items: Vec<ListItem> = session.tracks()[range.clone()]
        .iter()
        .enumerate()
        .map(|(offset, track)| {
            let index = range.start + offset;
            let mut spans = vec![Span::styled(
                track.name.as_str(),
                Style::default().fg(colors.text),
            )];
            if session.playing() == Some(index) && !session.is_paused() {
                spans.push(Span::styled(
                    format!(" {spinner}"),
                    Style::default().fg(colors.accent),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    if range.contains(&session.selected()) {
        state.select(Some(session.selected() - range.start));
    }

    let list = List::new(items)
        .block(panel_block(
            session.name(),
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_info(frame: &mut Frame, area: Rect, player: &Player, tick: u64, colors: &Palette) {
    let registry = player.registry();
    let mut lines: Vec<Line> = Vec::new();
    let width = usize::from(area.width.saturating_sub(2));

    if player.settings().show_logo {
        lines.extend(
            LOGO.iter()
                .map(|row| Line::from(Span::styled(*row, Style::default().fg(colors.accent)))),
        );
        lines.push(Line::default());
    }

    let active = registry.active_id();
    for session in &registry.sessions()[registry.page_range()] {
        let slot = session.id().0 % registry.page_size() + 1;
        let style = if Some(session.id()) == active {
            Style::default().fg(colors.bg).bg(colors.accent)
        } else {
            Style::default().fg(colors.text)
        };
        lines.push(Line::from(Span::styled(
            format!("[ {slot} ] {}", session.name()),
            style,
        )));
    }
    if registry.page_count() > 1 {
        lines.push(Line::from(Span::styled(
            format!("page {}/{}", registry.page() + 1, registry.page_count()),
            Style::default().fg(colors.muted),
        )));
    }
    lines.push(Line::default());

    match registry.active() {
        Some(session) if session.playing_track().is_some() => {
            now_playing_lines(&mut lines, player, session, tick, width, colors);
        }
        Some(session) => {
            lines.push(Line::from(format!("Playlist: {}", session.name())));
            lines.push(Line::from("No Song Playing"));
        }
        None => lines.push(Line::from("No Song Playing")),
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("Volume: {}", volume_bar(player.volume())),
        Style::default().fg(colors.text),
    )));

    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(colors.text))
            .block(panel_block("ampire", colors.panel_bg, colors.text, colors.border)),
        area,
    );
}

fn now_playing_lines(
    lines: &mut Vec<Line<'_>>,
    player: &Player,
    session: &PlaybackSession,
    tick: u64,
    width: usize,
    colors: &Palette,
) {
    let banner = if session.is_paused() { PAUSED } else { NOW_PLAYING };
    lines.push(Line::from(Span::styled(
        marquee(banner, tick as usize, width),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("Playlist: {}", session.name())));
    if let Some(track) = session.playing_track() {
        lines.push(Line::from(track.name.clone()));
    }

    if session.is_paused() {
        lines.push(Line::from(Span::styled(
            "Paused",
            Style::default().fg(colors.alert).add_modifier(Modifier::REVERSED),
        )));
    } else {
        lines.push(Line::from(format!(
            "Elapsed: [{}]",
            format_elapsed(player.elapsed_ms())
        )));
    }
    lines.push(Line::from(vec![
        Span::raw("Mode: "),
        Span::styled(
            session.mode().label(),
            Style::default().fg(colors.alert).add_modifier(Modifier::REVERSED),
        ),
    ]));
    if !session.explicit_queue().is_empty() {
        lines.push(Line::from(format!("Queued: {}", session.explicit_queue().len())));
    }

    let history = session.history();
    if history.is_empty() {
        return;
    }
    let start = history.len().saturating_sub(HISTORY_ROWS);
    lines.push(Line::from(if start > 0 {
        format!("History [...{start}]")
    } else {
        String::from("History")
    }));
    let equalizer = EQUALIZER[(tick % EQUALIZER.len() as u64) as usize];
    for (position, index) in history.iter().enumerate().skip(start) {
        let name = session.track(*index).map_or("?", |track| track.name.as_str());
        let latest = position + 1 == history.len();
        if latest && !session.is_paused() {
            lines.push(Line::from(vec![
                Span::raw(format!("  {name} ")),
                Span::styled(equalizer, Style::default().fg(colors.accent)),
            ]));
        } else if latest {
            lines.push(Line::from(format!("  {name}")));
        } else {
            lines.push(Line::from(Span::styled(
                format!("  {name}"),
                Style::default().fg(colors.muted),
            )));
        }
    }
}

fn draw_overlay(frame: &mut Frame, overlay: &Overlay, colors: &Palette) {
    let popup = centered_rect(frame.area(), 50, 20);
    frame.render_widget(Clear, popup);

    let (title, body) = match overlay {
        Overlay::Input {
            message, buffer, ..
        } => (*message, format!("{buffer}_")),
        Overlay::Confirm { message, .. } => (message.as_str(), String::from("[y]es / [n]o")),
    };
    frame.render_widget(
        Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(colors.text))
            .block(panel_block(title, colors.popup_bg, colors.text, colors.border)),
        popup,
    );
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
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

fn format_elapsed(elapsed_ms: u64) -> String {
    let total_seconds = elapsed_ms / 1_000;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

fn marquee(text: &str, frame: usize, width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    let shown = width.min(chars.len());
    (0..shown)
        .map(|offset| chars[(frame + offset) % chars.len()])
        .collect()
}

fn volume_bar(volume: Volume) -> String {
    if volume.is_muted() {
        return String::from("[MUTE]");
    }
    let level = usize::from(volume.level());
    let max = usize::from(MAX_VOLUME);
    let filled = ((level * VOLUME_BLOCKS + max - 1) / max).min(VOLUME_BLOCKS);
    format!(
        "[{}{}] {}%",
        "*".repeat(filled),
        " ".repeat(VOLUME_BLOCKS - filled),
        volume.percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(61_999), "01:01");
        assert_eq!(format_elapsed(3_600_000), "60:00");
    }

    #[test]
    fn marquee_rotates_and_truncates() {
        assert_eq!(marquee("abcd", 0, 10), "abcd");
        assert_eq!(marquee("abcd", 1, 10), "bcda");
        assert_eq!(marquee("abcd", 6, 2), "cd");
        assert_eq!(marquee("", 3, 5), "");
    }

    #[test]
    fn volume_bar_shows_mute() {
        assert_eq!(volume_bar(Volume::new(0)), "[MUTE]");
        assert_eq!(volume_bar(Volume::new(MAX_VOLUME)), format!("[{}] 100%", "*".repeat(12)));
        assert!(volume_bar(Volume::new(1)).starts_with("[*  "));
    }

    #[test]
    fn song_list_rows_exclude_borders_and_status() {
        assert_eq!(song_list_rows(Rect::new(0, 0, 80, 24)), 21);
        assert_eq!(song_list_rows(Rect::new(0, 0, 10, 2)), 1);
    }
}
