//! Carrier backed by the query string of a [`Url`].

use super::TextMapCarrier;
use ::url::{form_urlencoded, Url};
use opentelemetry::propagation::{Extractor, Injector};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Live view over a URL's query parameters.
///
/// Every operation re-parses the current query, so writes made through the
/// carrier are visible to the next read. One lock per carrier: readers run
/// concurrently, writers are exclusive.
pub struct UrlCarrier<'a> {
    url: RwLock<&'a mut Url>,
}

impl<'a> UrlCarrier<'a> {
    pub fn new(url: &'a mut Url) -> Self {
        Self {
            url: RwLock::new(url),
        }
    }

    /// First value of `key`, or an empty string.
    pub fn get(&self, key: &str) -> String {
        let url = self.url.read();
        url.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }

    /// Replaces every value of `key` with `value` and re-encodes the query.
    pub fn set(&self, key: &str, value: &str) {
        let mut url = self.url.write();
        let mut params = query_params(&url);
        params.insert(key.to_string(), vec![value.to_string()]);

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(
                params
                    .iter()
                    .flat_map(|(name, values)| values.iter().map(move |value| (name, value))),
            )
            .finish();
        url.set_query(Some(&query));
    }

    pub fn keys(&self) -> Vec<String> {
        let url = self.url.read();
        query_params(&url).into_keys().collect()
    }

    /// Copies the current parameters under a single read lock.
    pub fn snapshot(&self) -> QuerySnapshot {
        let url = self.url.read();
        let mut values = HashMap::new();
        for (name, value) in url.query_pairs() {
            values
                .entry(name.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        QuerySnapshot { values }
    }

    pub fn into_inner(self) -> &'a mut Url {
        self.url.into_inner()
    }
}

fn query_params(url: &Url) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        params
            .entry(name.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    params
}

impl TextMapCarrier for UrlCarrier<'_> {
    fn get(&self, key: &str) -> String {
        UrlCarrier::get(self, key)
    }

    fn set(&self, key: &str, value: &str) {
        UrlCarrier::set(self, key, value)
    }

    fn keys(&self) -> Vec<String> {
        UrlCarrier::keys(self)
    }
}

impl Injector for UrlCarrier<'_> {
    fn set(&mut self, key: &str, value: String) {
        UrlCarrier::set(self, key, &value)
    }
}

/// Point-in-time copy of a URL's query, readable by opentelemetry propagators.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    values: HashMap<String, String>,
}

impl Extractor for QuerySnapshot {
    fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datadog::{DatadogPropagator, PARENT_ID_HEADER, TRACE_ID_HEADER};
    use opentelemetry::propagation::TextMapPropagator;
    use opentelemetry::trace::{
        SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
    };
    use opentelemetry::Context;
    use opentelemetry_sdk::propagation::TraceContextPropagator;

    const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";
    const SPAN_ID: &str = "00f067aa0ba902b7";

    fn parse(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    fn w3c_span_context(flags: TraceFlags) -> SpanContext {
        SpanContext::new(
            TraceId::from_hex(TRACE_ID).unwrap(),
            SpanId::from_hex(SPAN_ID).unwrap(),
            flags,
            true,
            TraceState::default(),
        )
    }

    #[test]
    fn test_set_then_get() {
        let mut url = parse("http://test.example/");
        let carrier = UrlCarrier::new(&mut url);
        let value = format!("00-{}-{}-01", TRACE_ID, SPAN_ID);

        carrier.set("traceparent", &value);

        assert_eq!(carrier.get("traceparent"), value);
        assert_eq!(carrier.keys(), vec!["traceparent".to_string()]);
        assert_eq!(carrier.get("tracestate"), "");
    }

    #[test]
    fn test_set_overwrites_and_sorts() {
        let mut url = parse("http://test.example/path?z=1&a=2&a=3");
        let carrier = UrlCarrier::new(&mut url);
        assert_eq!(carrier.get("a"), "2");

        carrier.set("a", "x y&z");
        carrier.set("m", "4");

        let mut keys = carrier.keys();
        keys.sort();
        assert_eq!(keys, vec!["a", "m", "z"]);
        assert_eq!(carrier.get("a"), "x y&z");

        let url = carrier.into_inner();
        assert_eq!(url.query(), Some("a=x+y%26z&m=4&z=1"));
        assert_eq!(url.path(), "/path");
    }

    #[test]
    fn test_extract_from_empty_url() {
        let mut url = parse("http://test.example/");
        let carrier = UrlCarrier::new(&mut url);

        let cx = TraceContextPropagator::new().extract(&carrier.snapshot());
        assert_eq!(cx.span().span_context(), &SpanContext::empty_context());
    }

    #[test]
    fn test_w3c_round_trip() {
        let propagator = TraceContextPropagator::new();
        for (flag, flags) in [("00", TraceFlags::default()), ("01", TraceFlags::SAMPLED)] {
            let mut url = parse(&format!(
                "http://test.example/?traceparent=00-{}-{}-{}",
                TRACE_ID, SPAN_ID, flag
            ));
            let mut carrier = UrlCarrier::new(&mut url);

            // empty context: nothing to inject, existing header survives
            propagator.inject_context(&Context::new(), &mut carrier);

            let cx = propagator.extract(&carrier.snapshot());
            assert_eq!(cx.span().span_context(), &w3c_span_context(flags));
        }
    }

    #[test]
    fn test_w3c_inject_into_url() {
        let propagator = TraceContextPropagator::new();
        let cx = Context::new().with_remote_span_context(w3c_span_context(TraceFlags::SAMPLED));

        let mut url = parse("http://test.example/?q=rust");
        let mut carrier = UrlCarrier::new(&mut url);
        propagator.inject_context(&cx, &mut carrier);

        assert_eq!(
            carrier.get("traceparent"),
            format!("00-{}-{}-01", TRACE_ID, SPAN_ID)
        );
        assert_eq!(carrier.get("q"), "rust");
    }

    #[test]
    fn test_datadog_through_url() {
        let propagator = DatadogPropagator::new();
        let local = SpanContext::new(
            TraceId::from_hex("00000000000000000021dc1807524785").unwrap(),
            SpanId::from_hex("002197ec5d8a250e").unwrap(),
            TraceFlags::SAMPLED,
            false,
            TraceState::default(),
        );
        let cx = Context::new().with_remote_span_context(local.clone());

        let mut url = parse("http://test.example/");
        let mut carrier = UrlCarrier::new(&mut url);
        propagator.inject_context(&cx, &mut carrier);
        assert_eq!(carrier.get(TRACE_ID_HEADER), "9530669991610245");
        assert_eq!(carrier.get(PARENT_ID_HEADER), "9455715668862222");

        let extracted = propagator.extract(&carrier.snapshot());
        let span = extracted.span();
        let remote = span.span_context();
        assert_eq!(remote.trace_id(), local.trace_id());
        assert_eq!(remote.span_id(), local.span_id());
        assert!(remote.is_sampled());
        assert!(remote.is_remote());
    }

    #[test]
    fn test_concurrent_reads_see_whole_values() {
        let before = "a".repeat(256);
        let after = "b c&d".repeat(64);

        let mut url = parse("http://test.example/?keep=1");
        let carrier = UrlCarrier::new(&mut url);
        carrier.set("traceparent", &before);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for i in 0..200 {
                    let value = if i % 2 == 0 { &after } else { &before };
                    carrier.set("traceparent", value);
                }
            });
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..200 {
                        let value = carrier.get("traceparent");
                        assert!(value == before || value == after, "torn read: {}", value);
                        assert_eq!(carrier.get("keep"), "1");
                    }
                });
            }
        });

        let mut keys = carrier.keys();
        keys.sort();
        assert_eq!(keys, vec!["keep", "traceparent"]);
    }
}
