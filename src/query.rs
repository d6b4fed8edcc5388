pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter and pagination parameters driving both remote fetches.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub page: u32,
    pub page_size: u32,
    pub search: String,
    pub min_gpa: Option<f64>,
    pub max_gpa: Option<f64>,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search: String::new(),
            min_gpa: None,
            max_gpa: None,
        }
    }
}

impl QueryState {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    /// Both bounds are passed through to the API as given; this only lets
    /// callers notice a range that can never match.
    pub fn has_inverted_gpa_range(&self) -> bool {
        matches!((self.min_gpa, self.max_gpa), (Some(min), Some(max)) if min > max)
    }

    pub fn has_filters(&self) -> bool {
        !self.search.is_empty() || self.min_gpa.is_some() || self.max_gpa.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryAction {
    SetSearch(String),
    SetMinGpa(Option<f64>),
    SetMaxGpa(Option<f64>),
    SetPage(u32),
    SetPageSize(u32),
}

/// What kind of change a transition made. Filter changes may reshape the
/// result set, pagination changes only move the window over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Filter,
    Pagination,
}

impl QueryAction {
    pub fn change(&self) -> Change {
        match self {
            Self::SetSearch(_) | Self::SetMinGpa(_) | Self::SetMaxGpa(_) => Change::Filter,
            Self::SetPage(_) | Self::SetPageSize(_) => Change::Pagination,
        }
    }
}

/// Pure transition. Any filter change sends the view back to page 1.
pub fn reduce(state: &QueryState, action: QueryAction) -> QueryState {
    let mut next = state.clone();
    match action {
        QueryAction::SetSearch(search) => {
            next.search = search;
            next.page = 1;
        }
        QueryAction::SetMinGpa(value) => {
            next.min_gpa = value;
            next.page = 1;
        }
        QueryAction::SetMaxGpa(value) => {
            next.max_gpa = value;
            next.page = 1;
        }
        QueryAction::SetPage(page) => next.page = page,
        QueryAction::SetPageSize(page_size) => next.page_size = page_size,
    }
    next
}

#[derive(Debug, Default)]
pub struct QueryStateManager {
    state: QueryState,
}

impl QueryStateManager {
    pub fn new(state: QueryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn dispatch(&mut self, action: QueryAction) -> Change {
        let change = action.change();
        self.state = reduce(&self.state, action);
        if self.state.has_inverted_gpa_range() {
            tracing::warn!(
                min_gpa = ?self.state.min_gpa,
                max_gpa = ?self.state.max_gpa,
                "GPA range is inverted, no student can match"
            );
        }
        change
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> Change {
        self.dispatch(QueryAction::SetSearch(text.into()))
    }

    pub fn set_min_gpa(&mut self, value: Option<f64>) -> Change {
        self.dispatch(QueryAction::SetMinGpa(value))
    }

    pub fn set_max_gpa(&mut self, value: Option<f64>) -> Change {
        self.dispatch(QueryAction::SetMaxGpa(value))
    }

    pub fn set_page(&mut self, page: u32) -> Change {
        self.dispatch(QueryAction::SetPage(page))
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Change {
        self.dispatch(QueryAction::SetPageSize(page_size))
    }
}
