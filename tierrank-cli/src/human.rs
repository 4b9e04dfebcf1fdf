/// Terminal prompts: a person answers each comparison by typing 1 or 2.
use anyhow::Result;
use rand::Rng;
use std::io::{BufRead, Write};
use tierrank_core::{Candidate, Comparison, PendingInsertion, Verdict};

pub struct Terminal<R, W> {
    input: R,
    output: W,
    /// Show the pair in random order so the new title is not always on top.
    shuffle: bool,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Terminal {
            input,
            output,
            shuffle: true,
        }
    }

    /// Answer comparisons until the position is known.
    ///
    /// Returns `None` if the person quits (or input ends); the pending
    /// insertion is dropped and nothing is saved.
    pub fn rank(&mut self, mut pending: PendingInsertion) -> Result<Option<PendingInsertion>> {
        while let Some(cmp) = pending.next_comparison() {
            let Some(verdict) = self.ask(&cmp)? else {
                return Ok(None);
            };
            pending.apply_comparison_result(verdict)?;
        }
        Ok(Some(pending))
    }

    fn ask(&mut self, cmp: &Comparison<'_>) -> Result<Option<Verdict>> {
        let new_on_top = !self.shuffle || rand::rng().random_bool(0.5);
        let (one, two) = if new_on_top {
            (cmp.new_item, cmp.existing)
        } else {
            (cmp.existing, cmp.new_item)
        };

        writeln!(self.output, "\nComparison {} of at most {}", cmp.number, cmp.at_most)?;
        writeln!(self.output, "  1) {}", describe(one))?;
        writeln!(self.output, "  2) {}", describe(two))?;

        loop {
            write!(self.output, "Which do you prefer? [1/2, q to stop]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let picked_one = match line.trim() {
                "1" => true,
                "2" => false,
                "q" | "Q" => return Ok(None),
                other => {
                    writeln!(self.output, "Please type 1, 2 or q (got \"{other}\").")?;
                    continue;
                }
            };
            let verdict = if picked_one == new_on_top {
                Verdict::NewItem
            } else {
                Verdict::Existing
            };
            return Ok(Some(verdict));
        }
    }
}

fn describe(candidate: &Candidate) -> String {
    match candidate.poster_ref {
        Some(ref poster) => format!("{} [{poster}]", candidate.title),
        None => candidate.title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::io::Cursor;
    use tierrank_core::{Category, RankingState};

    fn state_with(titles: &[&str]) -> RankingState {
        let mut state = RankingState::new();
        for (i, title) in titles.iter().enumerate() {
            state
                .insert_at(Category::Liked, i, Candidate::new(i as i64, *title), Utc::now())
                .unwrap();
        }
        state
    }

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal {
            input: Cursor::new(input.as_bytes().to_vec()),
            output: Vec::new(),
            shuffle: false,
        }
    }

    #[test]
    fn test_answers_place_item() {
        let state = state_with(&["Heat", "Alien", "Ran"]);
        let pending = state
            .begin_insertion(Category::Liked, Candidate::new(9, "Jaws"))
            .unwrap();
        // loses to Heat, beats Ran, loses to Alien
        let mut term = terminal("2\n1\n2\n");
        let done = term.rank(pending).unwrap().unwrap();
        assert_eq!(done.rank(), Some(3));

        let shown = String::from_utf8(term.output).unwrap();
        assert!(shown.contains("Comparison 1 of at most 3"));
        assert!(shown.contains("1) Jaws"));
        assert!(shown.contains("2) Heat"));
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let state = state_with(&["Heat"]);
        let pending = state
            .begin_insertion(Category::Liked, Candidate::new(9, "Jaws"))
            .unwrap();
        let mut term = terminal("x\n1\n");
        let done = term.rank(pending).unwrap().unwrap();
        assert_eq!(done.rank(), Some(1));
        assert!(String::from_utf8(term.output).unwrap().contains("got \"x\""));
    }

    #[test]
    fn test_quit_abandons() {
        let state = state_with(&["Heat", "Alien"]);
        let pending = state
            .begin_insertion(Category::Liked, Candidate::new(9, "Jaws"))
            .unwrap();
        assert!(terminal("q\n").rank(pending).unwrap().is_none());
    }

    #[test]
    fn test_end_of_input_abandons() {
        let state = state_with(&["Heat"]);
        let pending = state
            .begin_insertion(Category::Liked, Candidate::new(9, "Jaws"))
            .unwrap();
        assert!(terminal("").rank(pending).unwrap().is_none());
    }

    #[test]
    fn test_describe_shows_poster() {
        let c = Candidate::new(1, "Heat").with_poster("heat.jpg");
        assert_eq!(describe(&c), "Heat [heat.jpg]");
    }
}
