use url::Url;

/// Session history for one tab: a list of entries and a cursor.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    entries: Vec<Url>,
    index: usize,
}

impl SessionHistory {
    /// Start a history whose only entry is the document's initial location.
    pub fn new(start: Url) -> Self {
        Self {
            entries: vec![start],
            index: 0,
        }
    }

    pub fn location(&self) -> &Url {
        &self.entries[self.index]
    }

    /// Add an entry after the current one, dropping any forward entries.
    pub fn push_state(&mut self, url: Url) {
        self.entries.truncate(self.index + 1);
        self.entries.push(url);
        self.index += 1;
    }

    /// Move one entry back. Returns false at the start of history.
    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    /// Move one entry forward. Returns false at the end of history.
    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.entries.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn entries(&self) -> &[Url] {
        &self.entries
    }
}
