//! Modal state as seen by the written output

use rust_decimal::Decimal;

use crate::line::{Line, Motion, Token};

/// Follows the motion mode and feed established by the lines actually
/// written, and restates them on a line that would otherwise run with a
/// mode or feed that some earlier rewrite took away.
#[derive(Debug, Default)]
pub(crate) struct ModalWriter {
    motion: Option<Motion>,
    feed: Option<Decimal>,
}

impl ModalWriter {
    /// Pass `line` on to the output. A verbatim line cannot be edited, so it
    /// comes back preceded by a bare line carrying what it needs.
    pub fn settle(&mut self, mut line: Line) -> (Option<Line>, Line) {
        let mut missing_motion = None;
        let mut missing_feed = None;

        let word = line
            .tokens
            .iter()
            .rev()
            .find(|t| t.motion().is_some() || t.is_other_motion() || t.is('G', 80));
        let moves = line.has_axis_words() && !line.consumes_axes();
        match (word, line.motion) {
            (Some(word), _) => self.motion = word.motion(),
            (None, Some(motion)) if moves && self.motion != Some(motion) => {
                self.motion = Some(motion);
                missing_motion = Some(motion);
            }
            _ => {}
        }

        if let Some(feed) = line.value('F') {
            self.feed = Some(feed);
        } else if moves
            && line.motion.is_some()
            && let Some(feed) = line.feed
            && self.feed != Some(feed)
        {
            self.feed = Some(feed);
            missing_feed = Some(feed);
        }

        if missing_motion.is_none() && missing_feed.is_none() {
            return (None, line);
        }
        if line.is_verbatim() {
            let tokens = missing_motion
                .map(Motion::token)
                .into_iter()
                .chain(missing_feed.map(|f| Token::new('F', f)))
                .collect();
            let mut bare = Line::new(line.number, tokens);
            bare.motion = line.motion;
            bare.plane = line.plane;
            bare.distance = line.distance;
            bare.feed = line.feed;
            bare.start = line.start;
            bare.position = line.start;
            return (Some(bare), line);
        }
        if let Some(motion) = missing_motion {
            line.ensure_motion_word(motion);
        }
        if let Some(feed) = missing_feed {
            line.ensure_feed(feed);
        }
        (None, line)
    }
}
