/// A recognised fence marker line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceLine {
    /// Lowercased, trimmed remainder after the backticks.
    pub language: String,
}

pub struct CodeFence;

impl CodeFence {
    pub const BACKTICKS: &'static str = "```";

    /// Any line whose stripped content begins with three backticks is a fence,
    /// whatever follows. Lines are passed without their `\n` terminator.
    pub fn parse(line: &str) -> Option<FenceLine> {
        let rest = line.trim().strip_prefix(Self::BACKTICKS)?;
        Some(FenceLine {
            language: rest.trim().to_lowercase(),
        })
    }
}
