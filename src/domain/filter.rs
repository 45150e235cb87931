use std::collections::BTreeSet;
use url::Url;
use url::form_urlencoded;

const DEVICE_UUIDS: &str = "device-uuids";
const CODES: &str = "codes";
const ACTIONS: &str = "actions";

/// Criteria narrowing which events a subscription receives. An empty dimension means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    device_ids: BTreeSet<String>,
    codes: BTreeSet<String>,
    actions: BTreeSet<String>,
}

impl Filter {
    pub fn new<I, J, K>(device_ids: I, codes: J, actions: K) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
        K: IntoIterator<Item = String>,
    {
        Filter {
            device_ids: non_empty(device_ids),
            codes: non_empty(codes),
            actions: non_empty(actions),
        }
    }

    pub fn device_ids(&self) -> &BTreeSet<String> {
        &self.device_ids
    }

    pub fn codes(&self) -> &BTreeSet<String> {
        &self.codes
    }

    pub fn actions(&self) -> &BTreeSet<String> {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.device_ids.is_empty() && self.codes.is_empty() && self.actions.is_empty()
    }

    pub fn set_device_ids(&mut self, ids: impl IntoIterator<Item = String>) {
        self.device_ids = non_empty(ids);
    }

    pub fn set_codes(&mut self, codes: impl IntoIterator<Item = String>) {
        self.codes = non_empty(codes);
    }

    pub fn set_actions(&mut self, actions: impl IntoIterator<Item = String>) {
        self.actions = non_empty(actions);
    }

    /// Merges the values of `other` into this filter, dimension by dimension.
    pub fn merge(mut self, other: Filter) -> Self {
        self.device_ids.extend(other.device_ids);
        self.codes.extend(other.codes);
        self.actions.extend(other.actions);
        self
    }

    fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let device_ids = self.device_ids.iter().map(|id| (DEVICE_UUIDS, id.as_str()));
        let codes = self.codes.iter().map(|code| (CODES, code.as_str()));
        let actions = self.actions.iter().map(|action| (ACTIONS, action.as_str()));
        device_ids.chain(codes).chain(actions)
    }

    /// Serializes the filter as repeated query parameters, e.g. `codes=motion&codes=tamper`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new()).extend_pairs(self.pairs()).finish()
    }

    /// Parses a query string produced by [`Filter::to_query_string`]. Absent, empty and unknown
    /// parameters are ignored, a leading `?` is allowed.
    pub fn from_query_string(query: &str) -> Self {
        let mut filter = Filter::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                DEVICE_UUIDS => filter.device_ids.insert(value.into_owned()),
                CODES => filter.codes.insert(value.into_owned()),
                ACTIONS => filter.actions.insert(value.into_owned()),
                _ => false,
            };
        }
        filter
    }

    /// Appends the filter to the query of `url`. An empty filter leaves the url untouched.
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs());
    }
}

fn non_empty(values: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    values.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect()
}
