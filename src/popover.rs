/// Open/closed state of the help popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopoverState {
    #[default]
    Closed,
    Open,
}

impl PopoverState {
    pub fn from_open(is_open: bool) -> Self {
        if is_open {
            PopoverState::Open
        } else {
            PopoverState::Closed
        }
    }

    pub fn is_open(self) -> bool {
        self == PopoverState::Open
    }

    /// State after one activation of the help button.
    pub fn toggled(self) -> Self {
        match self {
            PopoverState::Closed => PopoverState::Open,
            PopoverState::Open => PopoverState::Closed,
        }
    }

    /// Host callback form: the button reports its click count, which is
    /// empty (or zero) before the first click.
    pub fn on_activation(self, n_clicks: Option<u64>) -> Self {
        match n_clicks {
            Some(n) if n > 0 => self.toggled(),
            _ => self,
        }
    }
}
