//! Disambiguates properties reported by several endpoints of one device.
//!
//! A device with two temperature sensors on endpoints 1 and 2 would publish
//! `temperature` twice; wrapped converters publish `temperature_1` and
//! `temperature_2` instead.

use super::{ConvertContext, FromZigbee};
use crate::zigbee::{Cluster, EndpointId, MessageType, Payload};

/// Rename every key of `payload` to `<key>_<endpoint>`.
pub fn suffix_keys(payload: Payload, endpoint: EndpointId) -> Payload {
    payload
        .into_iter()
        .map(|(key, value)| (format!("{key}_{endpoint}"), value))
        .collect()
}

/// Wraps a report converter and suffixes its result keys with the source
/// endpoint of the message. The trigger is the inner converter's.
pub struct WithEndpointSuffix<C> {
    inner: C,
}

impl<C: FromZigbee> WithEndpointSuffix<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: FromZigbee> FromZigbee for WithEndpointSuffix<C> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn cluster(&self) -> Cluster {
        self.inner.cluster()
    }

    fn message_types(&self) -> &[MessageType] {
        self.inner.message_types()
    }

    fn matches(&self, cluster: Cluster, msg_type: MessageType) -> bool {
        self.inner.matches(cluster, msg_type)
    }

    /// Always `Some`: an inner "no result" becomes an empty mapping.
    fn convert(&self, ctx: &ConvertContext<'_>) -> Option<Payload> {
        let payload = self.inner.convert(ctx).unwrap_or_default();
        Some(suffix_keys(payload, ctx.message.endpoint))
    }
}
