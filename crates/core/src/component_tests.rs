// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn keys_round_trip() {
    for c in DEPLOY_ORDER {
        assert_eq!(Component::from_key(c.key()), Some(c), "key {}", c.key());
    }
}

#[test]
fn unknown_key_is_rejected() {
    assert_eq!(Component::from_key("workshop"), None);
    assert_eq!(Component::from_key(""), None);
    assert_eq!(Component::from_key("RELEASE"), None);
}

#[test]
fn deploy_order_ends_with_servers() {
    assert_eq!(DEPLOY_ORDER[0], Component::SteamCmd);
    assert_eq!(DEPLOY_ORDER[6], Component::Servers);
}

#[test]
fn selection_all_expands_in_order() {
    assert_eq!(Selection::All.components(), DEPLOY_ORDER.to_vec());
}

#[test]
fn selection_from_key() {
    assert_eq!(Selection::from_key("all"), Some(Selection::All));
    assert_eq!(
        Selection::from_key("bepinex"),
        Some(Selection::One(Component::BepInEx))
    );
    assert_eq!(Selection::from_key("nope"), None);
}

#[yare::parameterized(
    release = { Component::Release, Some(Channel::Release) },
    beta    = { Component::Beta, Some(Channel::Beta) },
    tool    = { Component::SteamCmd, None },
    servers = { Component::Servers, None },
)]
fn channel_mapping(component: Component, expected: Option<Channel>) {
    assert_eq!(component.channel(), expected);
}

#[test]
fn channel_component_round_trip() {
    assert_eq!(Channel::Release.component().channel(), Some(Channel::Release));
    assert_eq!(Channel::Beta.component().channel(), Some(Channel::Beta));
}

#[test]
fn serde_uses_lowercase_keys() {
    let json = serde_json::to_string(&Component::BepInEx).unwrap();
    assert_eq!(json, "\"bepinex\"");
    let back: Component = serde_json::from_str("\"relay\"").unwrap();
    assert_eq!(back, Component::CommandRelay);
}
