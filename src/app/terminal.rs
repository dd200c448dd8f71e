use crate::core::Presenter;
use crate::domain::model::{JobBoard, JobPosting};
use crate::utils::error::Result;
use std::io::Write;

/// Renders the board as plain text, active jobs first.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_card(&mut self, job: &JobPosting, session_mark: bool) -> Result<()> {
        let flag = if session_mark { " *" } else { "" };
        writeln!(self.out, "  [{}] {}{}", job.id, job.title, flag)?;
        writeln!(
            self.out,
            "      {} • {} • {}",
            job.company, job.salary_range, job.job_type
        )?;
        for requirement in &job.requirements {
            writeln!(self.out, "      - {}", requirement)?;
        }
        writeln!(self.out, "      Apply: {}", job.apply_url)?;
        Ok(())
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render(&mut self, board: &JobBoard) -> Result<()> {
        writeln!(self.out, "Active Jobs ({})", board.active.len())?;
        for job in &board.active {
            self.write_card(job, false)?;
        }

        // 沒有標記的工作時不顯示此區塊
        if !board.pending_deletion.is_empty() {
            writeln!(self.out)?;
            writeln!(
                self.out,
                "{} ({})",
                board.pending_heading(),
                board.pending_deletion.len()
            )?;
            for job in &board.pending_deletion {
                let session_mark = board.marked_this_session.contains(&job.id);
                self.write_card(job, session_mark)?;
            }
        }

        self.out.flush()?;
        Ok(())
    }
}
