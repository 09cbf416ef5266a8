#[derive(Debug, Clone)]
pub(crate) enum AllocError {
    WindowNotFound(usize),
    UnregisteredPe { win: usize, pe: usize },
}

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AllocError::WindowNotFound(win) => {
                write!(f, "window {} is not registered with this fabric", win)
            }
            AllocError::UnregisteredPe { win, pe } => {
                write!(
                    f,
                    "pe {} did not register window {}, window creation must be collective",
                    pe, win
                )
            }
        }
    }
}

impl std::error::Error for AllocError {}

pub(crate) type AllocResult<T> = Result<T, AllocError>;
