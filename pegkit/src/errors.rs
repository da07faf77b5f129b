use anyhow::anyhow;

/// Append-only error accumulator.
///
/// Pipeline stages push into a bag and keep producing partial output;
/// the pipeline decides between stages whether to halt. `join` collapses
/// everything collected so far into one report.
#[derive(Debug, Default)]
pub struct ErrorBag {
    errors: Vec<anyhow::Error>,
}

impl ErrorBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: anyhow::Error) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    /// All collected errors joined into one, or `None` when empty.
    pub fn join(&self) -> Option<anyhow::Error> {
        if self.errors.is_empty() {
            return None;
        }
        let text = self
            .errors
            .iter()
            .map(|e| format!("{e}"))
            .collect::<Vec<_>>()
            .join("\n");
        Some(anyhow!(text))
    }

    /// `Ok(())` when empty, the joined error otherwise.
    pub fn into_result(self) -> Result<(), anyhow::Error> {
        match self.join() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn empty_bag_joins_to_none() {
        let bag = ErrorBag::new();
        assert!(bag.is_empty());
        assert!(bag.join().is_none());
        assert!(bag.into_result().is_ok());
    }

    #[test]
    fn join_concatenates_in_push_order() {
        let mut bag = ErrorBag::new();
        bag.push(anyhow!("first"));
        bag.push(anyhow!("second"));
        assert_eq!(bag.len(), 2);
        let joined = bag.join().unwrap().to_string();
        assert_eq!(joined, "first\nsecond");
    }

    #[test]
    fn pushing_never_aborts() {
        let mut bag = ErrorBag::new();
        for i in 0..100 {
            bag.push(anyhow!("e{i}"));
        }
        assert_eq!(bag.len(), 100);
    }
}
