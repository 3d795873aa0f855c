use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    scoring::FeedbackCategory,
    session::Phase,
    surface::{Board, Controls},
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const MIN_FIELD_WIDTH: u16 = 16;

impl Widget for &Board {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.phase {
            Phase::NotStarted => render_title(self, area, buf),
            Phase::QuestionActive | Phase::QuestionAnswered => render_question(self, area, buf),
            Phase::Finished => render_summary(self, area, buf),
        }
    }
}

/// Key hints for the controls that are currently live
pub fn legend(controls: &Controls) -> String {
    let mut keys = Vec::new();
    if controls.start {
        keys.push("(enter) start".to_string());
    }
    if controls.submit {
        keys.push("(enter) submit".to_string());
    }
    if controls.play {
        keys.push("(tab) play".to_string());
    }
    if controls.next {
        keys.push(format!("(enter) {}", controls.next_label.to_string().to_lowercase()));
    }
    keys.push("(ctrl+r) reset".to_string());
    keys.push("(esc)ape".to_string());
    keys.join(" / ")
}

fn feedback_style(category: FeedbackCategory) -> Style {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    match category {
        FeedbackCategory::Success => bold_style.fg(Color::Green),
        FeedbackCategory::Warning => bold_style.fg(Color::Rgb(255, 165, 0)),
        FeedbackCategory::Error => bold_style.fg(Color::Red),
    }
}

fn score_line(board: &Board) -> Line<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled(
            format!("✔ {}", board.score.correct),
            bold_style.fg(Color::Green),
        ),
        Span::raw("   "),
        Span::styled(format!("✘ {}", board.score.wrong), bold_style.fg(Color::Red)),
    ])
}

fn legend_paragraph(board: &Board) -> Paragraph<'static> {
    Paragraph::new(Span::styled(
        legend(&board.controls),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
}

fn render_title(board: &Board, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // title
            Constraint::Length(1),
            Constraint::Length(2), // prompt
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "-- --- .-. ... .   MORSE QUIZ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(board.prompt.as_str())
        .style(Style::default().add_modifier(Modifier::DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    legend_paragraph(board).render(chunks[5], buf);
}

fn render_question(board: &Board, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let dim_bold_style = bold_style.add_modifier(Modifier::DIM);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1), // position + countdown
            Constraint::Length(1),
            Constraint::Length(1), // morse
            Constraint::Length(1), // prompt
            Constraint::Length(1),
            Constraint::Length(3), // answer field
            Constraint::Length(1), // feedback
            Constraint::Length(1), // score
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    Paragraph::new(Span::styled(board.position.as_str(), dim_bold_style))
        .alignment(Alignment::Left)
        .render(header[0], buf);

    let countdown_style = if board.phase == Phase::QuestionActive {
        bold_style.fg(Color::Yellow)
    } else {
        dim_bold_style
    };
    Paragraph::new(Span::styled(board.countdown.as_str(), countdown_style))
        .alignment(Alignment::Right)
        .render(header[1], buf);

    Paragraph::new(Span::styled(
        board.morse.as_str(),
        bold_style.fg(Color::Magenta),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        board.prompt.as_str(),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[4], buf);

    render_answer_field(board, chunks[6], buf);

    if let Some(feedback) = &board.feedback {
        Paragraph::new(Span::styled(
            feedback.message.as_str(),
            feedback_style(feedback.category),
        ))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);
    }

    Paragraph::new(score_line(board))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

    legend_paragraph(board).render(chunks[10], buf);
}

fn render_answer_field(board: &Board, area: Rect, buf: &mut Buffer) {
    let enabled = board.controls.answer;
    let text_width = board.answer().width() as u16;
    let width = (text_width + 4).max(MIN_FIELD_WIDTH).min(area.width);

    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(area);

    let mut spans = vec![Span::styled(
        board.answer().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if enabled {
        spans.push(Span::styled(
            " ",
            Style::default().add_modifier(Modifier::UNDERLINED | Modifier::DIM),
        ));
    }

    let border_style = if enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title("answer"),
        )
        .render(row[1], buf);
}

fn render_summary(board: &Board, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(2), // verdict
            Constraint::Length(1), // score
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(
        board.prompt.as_str(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .render(chunks[1], buf);

    Paragraph::new(score_line(board))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    legend_paragraph(board).render(chunks[4], buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Feedback;
    use crate::session::Score;
    use crate::surface::{NextLabel, Surface};

    fn rendered(board: &Board, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buffer = Buffer::empty(area);
        board.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    fn active_board() -> Board {
        let mut board = Board::new();
        board.show_phase(Phase::QuestionActive);
        board.show_position("Question 2 / 10");
        board.show_countdown("Time Left: 17s");
        board.show_morse("L  .-..");
        board.show_prompt("Type the letter shown");
        board.set_controls(Controls {
            play: true,
            answer: true,
            submit: true,
            ..Default::default()
        });
        board.type_char('L');
        board
    }

    #[test]
    fn test_title_screen() {
        let mut board = Board::new();
        board.show_prompt("Listen to the code");
        board.set_controls(Controls {
            start: true,
            ..Default::default()
        });
        let out = rendered(&board, 80, 24);
        assert!(out.contains("MORSE QUIZ"));
        assert!(out.contains("(enter) start"));
    }

    #[test]
    fn test_question_screen_shows_slots() {
        let out = rendered(&active_board(), 80, 24);
        assert!(out.contains("Question 2 / 10"));
        assert!(out.contains("Time Left: 17s"));
        assert!(out.contains("L  .-.."));
        assert!(out.contains("Type the letter shown"));
        assert!(out.contains("(tab) play"));
    }

    #[test]
    fn test_answered_screen_shows_feedback() {
        let mut board = active_board();
        board.show_phase(Phase::QuestionAnswered);
        board.show_feedback(Some(&Feedback {
            message: "✘ Wrong! Correct answer: L".to_string(),
            category: FeedbackCategory::Error,
        }));
        board.show_score(Score {
            correct: 0,
            wrong: 1,
        });
        board.set_controls(Controls {
            next: true,
            ..Default::default()
        });

        let out = rendered(&board, 80, 24);
        assert!(out.contains("Correct answer: L"));
        assert!(out.contains("(enter) next"));
        assert!(!out.contains("(tab) play"));
    }

    #[test]
    fn test_summary_screen() {
        let mut board = Board::new();
        board.show_phase(Phase::Finished);
        board.show_prompt("Finished! 7 correct, 3 wrong out of 10");
        board.set_controls(Controls {
            start: true,
            ..Default::default()
        });
        let out = rendered(&board, 80, 24);
        assert!(out.contains("Finished! 7 correct, 3 wrong out of 10"));
    }

    #[test]
    fn test_small_area_does_not_panic() {
        let board = active_board();
        let area = Rect::new(0, 0, 12, 4);
        let mut buffer = Buffer::empty(area);
        board.render(area, &mut buffer);
        assert_eq!(*buffer.area(), area);
    }

    #[test]
    fn test_legend() {
        let controls = Controls {
            next: true,
            next_label: NextLabel::Finish,
            ..Default::default()
        };
        assert_eq!(
            legend(&controls),
            "(enter) finish / (ctrl+r) reset / (esc)ape"
        );

        let controls = Controls {
            play: true,
            answer: true,
            submit: true,
            ..Default::default()
        };
        assert_eq!(
            legend(&controls),
            "(enter) submit / (tab) play / (ctrl+r) reset / (esc)ape"
        );
    }

    #[test]
    fn test_feedback_colours() {
        assert_eq!(
            feedback_style(FeedbackCategory::Success).fg,
            Some(Color::Green)
        );
        assert_eq!(
            feedback_style(FeedbackCategory::Warning).fg,
            Some(Color::Rgb(255, 165, 0))
        );
        assert_eq!(feedback_style(FeedbackCategory::Error).fg, Some(Color::Red));
    }
}
