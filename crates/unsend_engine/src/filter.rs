/// Operator keyword rules applied to own-authored candidates.
///
/// Keywords are matched case-insensitively as substrings of the message text.
/// Ignore keywords always win over delete keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordFilter {
    enabled: bool,
    delete: Vec<String>,
    ignore: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(enabled: bool, delete: I, ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            enabled,
            delete: normalize(delete),
            ignore: normalize(ignore),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn allows(&self, text: &str) -> bool {
        if !self.enabled {
            return true;
        }
        let text = text.to_lowercase();
        if self.ignore.iter().any(|kw| text.contains(kw.as_str())) {
            return false;
        }
        self.delete.is_empty() || self.delete.iter().any(|kw| text.contains(kw.as_str()))
    }
}

fn normalize<I, S>(keywords: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keywords
        .into_iter()
        .map(|kw| kw.as_ref().trim().to_lowercase())
        .filter(|kw| !kw.is_empty())
        .collect()
}
