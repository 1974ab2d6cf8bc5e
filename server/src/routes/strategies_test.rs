use super::*;

#[test]
fn toggle_status_names_the_new_state() {
    assert_eq!(ToggleResponse::new(3, true).status, "activated");
    assert_eq!(ToggleResponse::new(3, false).status, "deactivated");
}

#[tokio::test]
async fn available_lists_registered_strategies() {
    let Json(body) = available().await;
    assert!(body.strategies.iter().any(|s| s.name == "ema_crossover"));
}
