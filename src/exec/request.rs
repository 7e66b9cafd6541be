// src/exec/request.rs

//! Invocation request and the pure command builder.

/// One command-line option: a flag and its optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOption {
    pub flag: String,
    pub value: Option<String>,
}

/// Ordered options plus the URLs to process.
///
/// Options keep insertion order and are never deduplicated by `add_*`;
/// adding the same flag twice passes it twice. Use [`Request::set_option`]
/// to replace a flag instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    urls: Vec<String>,
    options: Vec<RequestOption>,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            options: Vec::new(),
        }
    }

    pub fn with_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            options: Vec::new(),
        }
    }

    pub fn add_url(&mut self, url: impl Into<String>) -> &mut Self {
        self.urls.push(url.into());
        self
    }

    /// Append a flag without a value, e.g. `--dump-json`.
    pub fn add_option(&mut self, flag: impl Into<String>) -> &mut Self {
        self.options.push(RequestOption {
            flag: flag.into(),
            value: None,
        });
        self
    }

    /// Append a flag with a value, e.g. `-f best`.
    pub fn add_option_value(
        &mut self,
        flag: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.options.push(RequestOption {
            flag: flag.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Drop every entry for `flag` and append a single new one at the end.
    pub fn set_option(&mut self, flag: &str, value: Option<String>) -> &mut Self {
        self.remove_option(flag);
        self.options.push(RequestOption {
            flag: flag.to_string(),
            value,
        });
        self
    }

    /// Remove every entry for `flag`; returns how many were removed.
    pub fn remove_option(&mut self, flag: &str) -> usize {
        let before = self.options.len();
        self.options.retain(|opt| opt.flag != flag);
        before - self.options.len()
    }

    /// Exact, case-sensitive presence check.
    pub fn has_option(&self, flag: &str) -> bool {
        self.options.iter().any(|opt| opt.flag == flag)
    }

    /// Value of the first entry for `flag`, if that entry has one.
    pub fn option_value(&self, flag: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|opt| opt.flag == flag)
            .and_then(|opt| opt.value.as_deref())
    }

    pub fn options(&self) -> &[RequestOption] {
        &self.options
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}

/// Flatten a request into arguments: every option in insertion order
/// (flag, then its value when present), followed by the URLs.
pub fn build_command(request: &Request) -> Vec<String> {
    let mut args = Vec::with_capacity(request.options.len() * 2 + request.urls.len());
    for opt in &request.options {
        args.push(opt.flag.clone());
        if let Some(value) = &opt.value {
            args.push(value.clone());
        }
    }
    args.extend(request.urls.iter().cloned());
    args
}
