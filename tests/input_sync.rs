use xg_terminal::config::AppConfig;
use xg_terminal::inputs::{Nudge, Param};
use xg_terminal::state::{AppState, Focus};

fn fresh_state() -> AppState {
    AppState::new(&AppConfig::default())
}

#[test]
fn leaving_a_row_commits_its_field_to_the_slider() {
    let mut state = fresh_state();
    assert_eq!(state.focus, Focus::Xg);

    state.backspace();
    state.backspace();
    state.backspace();
    for c in "7.5".chars() {
        state.type_char(c);
    }
    // Typing alone never moves the slider.
    assert_eq!(state.xg.slider(), 5.0);

    state.focus_next();
    assert_eq!(state.focus, Focus::Shots);
    assert_eq!(state.xg.slider(), 7.5);
    assert_eq!(state.xg.field(), "7.5");
}

#[test]
fn garbage_commit_is_swallowed_without_notice() {
    let mut state = fresh_state();
    state.focus = Focus::Goals;
    state.goals.set_field("three");

    state.focus_prev();

    assert_eq!(state.focus, Focus::Shots);
    assert_eq!(state.goals.slider(), 3.0);
    assert_eq!(state.goals.field(), "three");
    assert!(state.notice.is_none());
}

#[test]
fn slider_nudge_rewrites_focused_field() {
    let mut state = fresh_state();
    state.focus = Focus::Shots;
    state.nudge_focused(Nudge::Up);
    state.nudge_focused(Nudge::Up);
    assert_eq!(state.shots.field(), "22");

    state.focus = Focus::Xg;
    state.nudge_focused(Nudge::Down);
    assert_eq!(state.xg.field(), "4.9");
}

#[test]
fn out_of_range_field_clamps_slider_only() {
    let mut state = fresh_state();
    state.focus = Focus::Goals;
    state.goals.set_field("75");
    state.commit_focused();

    assert_eq!(state.goals.slider(), 50.0);
    assert_eq!(state.goals.field(), "75");
}

#[test]
fn player_row_edits_label_and_ignores_sliders() {
    let mut state = fresh_state();
    state.focus = Focus::Player;
    for _ in 0.."Player".len() {
        state.backspace();
    }
    for c in "Son".chars() {
        state.type_char(c);
    }
    state.nudge_focused(Nudge::Up);

    assert_eq!(state.player_label, "Son");
    for param in Param::ALL {
        let input = state.input(param);
        assert_eq!(input.field(), param.format_value(input.slider()));
    }
}

#[test]
fn blank_player_label_analyzes_as_default() {
    let mut state = fresh_state();
    state.player_label = "   ".to_string();
    state.analyze().unwrap();
    assert!(state.chart.unwrap().title.starts_with("Player\n"));
}
