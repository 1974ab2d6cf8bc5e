use super::*;

#[test]
fn resolve_route_matches_the_four_literal_paths() {
    assert_eq!(resolve_route("/"), Some(TerminalRoute::Dashboard));
    assert_eq!(resolve_route("/config"), Some(TerminalRoute::Config));
    assert_eq!(resolve_route("/strategies"), Some(TerminalRoute::Strategies));
    assert_eq!(resolve_route("/control"), Some(TerminalRoute::Control));
}

#[test]
fn resolve_route_tolerates_single_trailing_slash() {
    assert_eq!(resolve_route("/config/"), Some(TerminalRoute::Config));
    assert_eq!(resolve_route("/control/"), Some(TerminalRoute::Control));
}

#[test]
fn resolve_route_rejects_unknown_and_nested_paths() {
    assert_eq!(resolve_route("/unknown"), None);
    assert_eq!(resolve_route("/config/x"), None);
    assert_eq!(resolve_route("/Config"), None);
    assert_eq!(resolve_route(""), None);
    assert_eq!(resolve_route("//"), None);
}

#[test]
fn route_paths_are_unique() {
    let mut paths: Vec<&str> = NAV_LINKS.iter().map(|r| r.path()).collect();
    paths.sort_unstable();
    paths.dedup();
    assert_eq!(paths.len(), NAV_LINKS.len());
}

#[test]
fn every_nav_link_round_trips_through_resolve() {
    for route in NAV_LINKS {
        assert_eq!(resolve_route(route.path()), Some(route));
    }
}

#[test]
fn headings_match_view_content() {
    assert_eq!(TerminalRoute::Dashboard.heading(), "Dashboard");
    assert_eq!(TerminalRoute::Config.heading(), "Configuration");
    assert_eq!(TerminalRoute::Strategies.heading(), "Strategies");
    assert_eq!(TerminalRoute::Control.heading(), "Controls");
}

#[test]
fn nav_labels_are_in_sidebar_order() {
    let labels: Vec<&str> = NAV_LINKS.iter().map(|r| r.label()).collect();
    assert_eq!(labels, ["Dashboard", "Config", "Strategies", "Controls"]);
}

#[test]
fn taglines_describe_each_view() {
    assert_eq!(TerminalRoute::Dashboard.tagline(), "System Status & Live P&L");
    assert_eq!(TerminalRoute::Config.tagline(), "Dhan API Settings");
    assert_eq!(TerminalRoute::Strategies.tagline(), "Manage Trading Strategies");
    assert_eq!(TerminalRoute::Control.tagline(), "Kill Switch & Risk Settings");
}

#[test]
fn document_title_uses_heading_or_not_found() {
    assert_eq!(document_title("/config"), "Configuration · Dhan Algo Terminal");
    assert_eq!(document_title("/nope"), "Not Found · Dhan Algo Terminal");
}
