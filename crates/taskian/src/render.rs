//! Terminal rendering of task sections and goal progress.

use clap::ValueEnum;
use crossterm::style::{Color, Stylize};
use taskian_app::{DisplayConfig, Session};
use taskian_core::{Goal, Subtask, Task};

const STRIKE: char = '\u{0336}';
const DONE_SUFFIX: &str = " [Done]";

/// Which part of the lists `ls` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    #[value(alias = "t")]
    Today,
    #[value(alias = "o")]
    Overdue,
    #[value(alias = "tm")]
    Tomorrow,
    #[value(alias = "f")]
    Future,
    #[value(alias = "g")]
    Goals,
    #[value(alias = "at")]
    AllTasks,
    #[value(alias = "a")]
    All,
}

#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    color: bool,
    strike_through: bool,
}

impl Renderer {
    pub const fn new(display: DisplayConfig) -> Self {
        Self {
            color: display.color,
            strike_through: display.strike_through,
        }
    }

    /// Goals (only when any), then overdue (only when any), today, and
    /// tomorrow (only when any).
    pub fn smart(&self, session: &Session) -> String {
        let mut sections = Vec::new();
        if !session.goals().is_empty() {
            sections.push(self.goals(session));
        }
        if session.tasks().is_empty() {
            sections.push(format!("\n  {}\n", self.paint("NO TASKS TO DISPLAY", Color::Red)));
            return sections.concat();
        }
        if session.overdue().next().is_some() {
            sections.push(self.overdue(session));
        }
        sections.push(self.today(session));
        if session.due_tomorrow().next().is_some() {
            sections.push(self.tomorrow(session));
        }
        sections.concat()
    }

    pub fn view(&self, session: &Session, view: View) -> String {
        match view {
            View::Today => self.today(session),
            View::Overdue => self.overdue(session),
            View::Tomorrow => self.tomorrow(session),
            View::Future => self.future(session),
            View::Goals => self.goals(session),
            View::AllTasks => self.all_tasks(session),
            View::All => self.all_tasks(session) + &self.goals(session),
        }
    }

    fn all_tasks(&self, session: &Session) -> String {
        [
            self.overdue(session),
            self.today(session),
            self.tomorrow(session),
            self.future(session),
        ]
        .concat()
    }

    fn overdue(&self, session: &Session) -> String {
        let rows = session.overdue().map(|(task, days)| {
            let label = if days == 1 {
                "[Due Yesterday]".to_owned()
            } else {
                format!("[Due {days} Days Ago]")
            };
            self.task_rows(task, Some(label.as_str()))
        });
        self.section("OVERDUE TASKS", Color::Red, rows, "No Tasks Found")
    }

    fn today(&self, session: &Session) -> String {
        let rows = session.due_today().map(|task| self.task_rows(task, None));
        self.section("TODAY'S TASKS", Color::Green, rows, "No Tasks Found")
    }

    fn tomorrow(&self, session: &Session) -> String {
        let rows = session.due_tomorrow().map(|task| self.task_rows(task, None));
        self.section("TOMORROW'S TASKS", Color::DarkYellow, rows, "No Tasks Found")
    }

    fn future(&self, session: &Session) -> String {
        let rows = session.future().map(|(task, days)| {
            let label = format!("[Due in {days} Days]");
            self.task_rows(task, Some(label.as_str()))
        });
        self.section("FUTURE TASKS", Color::Blue, rows, "No Tasks Found")
    }

    fn goals(&self, session: &Session) -> String {
        let rows = session
            .goals()
            .goals()
            .iter()
            .map(|goal| vec![self.goal_row(goal)]);
        self.section("GOALS", Color::Magenta, rows, "No Goals Found")
    }

    fn section(
        &self,
        title: &str,
        color: Color,
        rows: impl Iterator<Item = Vec<String>>,
        empty: &str,
    ) -> String {
        let mut lines = vec![String::new(), format!("  {}", self.paint(title, color))];
        let header_len = lines.len();
        lines.extend(rows.flatten());
        if lines.len() == header_len {
            lines.push(format!("    {empty}"));
        }
        lines.push(String::new());
        lines.join("\n")
    }

    fn task_rows(&self, task: &Task, label: Option<&str>) -> Vec<String> {
        let mut rows = vec![match label {
            Some(label) => format!("{:>5} | {} {label}", task.id, task.description),
            None => format!("{:>5} | {}", task.id, task.description),
        }];
        rows.extend(
            task.subtasks
                .iter()
                .enumerate()
                .map(|(idx, item)| format!("{:>9}) {}", idx + 1, self.subtask_text(item))),
        );
        rows
    }

    fn subtask_text(&self, item: &Subtask) -> String {
        match (item.done, self.strike_through) {
            (false, _) => item.description.clone(),
            (true, true) => item
                .description
                .chars()
                .flat_map(|ch| [ch, STRIKE])
                .collect(),
            (true, false) => format!("{}{DONE_SUFFIX}", item.description),
        }
    }

    fn goal_row(&self, goal: &Goal) -> String {
        let title = match &goal.target {
            Some(target) => format!("{} [Target: {target}]", goal.description.to_uppercase()),
            None => goal.description.to_uppercase(),
        };
        let (filled, empty) = goal.progress_segments();
        let bar = format!(
            "{}{}",
            self.paint(&"+".repeat(usize::from(filled)), Color::Green),
            self.paint(&"-".repeat(usize::from(empty)), Color::Red)
        );
        format!("{:>5} | {title:<60} {bar}", goal.id)
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            text.with(color).to_string()
        } else {
            text.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskian_core::{DEFAULT_UNDO_DEPTH, Recurrence};
    use time::macros::date;
    use time::{Date, Duration};

    const TODAY: Date = date!(2024 - 02 - 14);

    fn plain(strike_through: bool) -> Renderer {
        Renderer::new(DisplayConfig {
            color: false,
            strike_through,
        })
    }

    fn session() -> Session {
        Session::new(TODAY, DEFAULT_UNDO_DEPTH)
    }

    #[test]
    fn empty_session_says_so() {
        let text = plain(true).smart(&session());
        assert!(text.contains("NO TASKS TO DISPLAY"));

        let text = plain(true).view(&session(), View::Goals);
        assert!(text.contains("GOALS"));
        assert!(text.contains("No Goals Found"));
    }

    #[test]
    fn smart_display_skips_empty_overdue_and_tomorrow() {
        let mut session = session();
        session.add_task("today only", None, None);
        let text = plain(true).smart(&session);
        assert!(text.contains("TODAY'S TASKS"));
        assert!(text.contains("    1 | today only"));
        assert!(!text.contains("OVERDUE"));
        assert!(!text.contains("TOMORROW'S"));

        session.add_task("late", Some(TODAY - Duration::days(1)), None);
        session.add_task("next", Some(TODAY + Duration::days(1)), None);
        let text = plain(true).smart(&session);
        let overdue = text.find("OVERDUE TASKS");
        let today = text.find("TODAY'S TASKS");
        let tomorrow = text.find("TOMORROW'S TASKS");
        assert!(overdue < today && today < tomorrow);
        assert!(text.contains("late [Due Yesterday]"));
    }

    #[test]
    fn smart_display_leads_with_goals_when_present() -> anyhow::Result<()> {
        let mut session = session();
        assert!(!plain(true).smart(&session).contains("GOALS"));

        session.add_goal("learn piano", None, Some(10))?;
        let text = plain(true).smart(&session);
        assert!(text.contains("LEARN PIANO"));
        assert!(text.find("GOALS") < text.find("NO TASKS TO DISPLAY"));

        session.add_task("practice scales", None, None);
        let text = plain(true).smart(&session);
        assert!(text.find("GOALS") < text.find("TODAY'S TASKS"));
        Ok(())
    }

    #[test]
    fn day_labels() {
        let mut session = session();
        session.add_task("old", Some(TODAY - Duration::days(4)), None);
        session.add_task("far", Some(TODAY + Duration::days(9)), None);
        let renderer = plain(true);
        assert!(renderer.view(&session, View::Overdue).contains("old [Due 4 Days Ago]"));
        assert!(renderer.view(&session, View::Future).contains("far [Due in 9 Days]"));
        assert!(renderer.view(&session, View::Tomorrow).contains("No Tasks Found"));
    }

    #[test]
    fn done_subtasks_are_struck_or_suffixed() -> anyhow::Result<()> {
        let mut session = session();
        session.add_task("pack", None, Some(Recurrence::None));
        session.add_subtask(1, "ab")?;
        session.add_subtask(1, "cd")?;
        session.complete_subtask(1, 1)?;

        let struck = plain(true).view(&session, View::Today);
        assert!(struck.contains("        1) a\u{336}b\u{336}"));
        assert!(struck.contains("        2) cd"));

        let suffixed = plain(false).view(&session, View::Today);
        assert!(suffixed.contains("1) ab [Done]"));
        Ok(())
    }

    #[test]
    fn goal_rows_show_target_and_bar() -> anyhow::Result<()> {
        let mut session = session();
        session.add_goal("run a marathon", Some("October".into()), Some(67))?;
        let text = plain(true).view(&session, View::Goals);
        let row = text
            .lines()
            .find(|line| line.contains("RUN A MARATHON"))
            .unwrap_or_default();
        assert!(row.contains("[Target: October]"));
        assert!(row.ends_with(&format!("{}{}", "+".repeat(13), "-".repeat(7))));
        Ok(())
    }

    #[test]
    fn color_wraps_headers_in_escape_codes() {
        let mut session = session();
        session.add_task("x", None, None);
        if std::env::var_os("NO_COLOR").is_none() {
            let colored = Renderer::new(DisplayConfig::default()).smart(&session);
            assert!(colored.contains("\u{1b}["));
        }
        assert!(!plain(true).smart(&session).contains("\u{1b}["));
    }
}
