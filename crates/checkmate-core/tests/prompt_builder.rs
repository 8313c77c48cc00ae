use checkmate_core::{
    build_evaluation_prompt, parse_requirements, CheckmateError, Requirement, Strictness,
};

fn reqs() -> Vec<Requirement> {
    parse_requirements("글자 수 800~1200자\n\n  제안자 언급  \n")
}

#[test]
fn prompt_is_deterministic() {
    let a = build_evaluation_prompt(&reqs(), "학생 글", Strictness::Normal).unwrap();
    let b = build_evaluation_prompt(&reqs(), "학생 글", Strictness::Normal).unwrap();
    assert_eq!(a, b);
}

#[test]
fn prompt_numbers_requirements_in_input_order() {
    let prompt = build_evaluation_prompt(&reqs(), "학생 글", Strictness::Normal).unwrap();
    let first = prompt.find("1. 글자 수 800~1200자").expect("first requirement");
    let second = prompt.find("2. 제안자 언급").expect("second requirement");
    assert!(first < second);
}

#[test]
fn prompt_embeds_submission_verbatim() {
    let submission = "  첫 줄\n\n둘째 줄 {괄호} 'quote'  ";
    let prompt = build_evaluation_prompt(&reqs(), submission, Strictness::Normal).unwrap();
    assert!(prompt.contains(&format!("[학생 글]\n{submission}\n")));
}

#[test]
fn strictness_changes_only_the_rubric() {
    let lenient = build_evaluation_prompt(&reqs(), "글", Strictness::Lenient).unwrap();
    let strict = build_evaluation_prompt(&reqs(), "글", Strictness::Strict).unwrap();
    assert_ne!(lenient, strict);
    assert!(lenient.contains(Strictness::Lenient.rubric()));
    assert!(strict.contains(Strictness::Strict.rubric()));
}

#[test]
fn prompt_embeds_schema() {
    let prompt = build_evaluation_prompt(&reqs(), "글", Strictness::Normal).unwrap();
    assert!(prompt.contains("\"conditions\""));
    assert!(prompt.contains("\"condition_text\""));
    assert!(prompt.contains("JSON"));
}

#[test]
fn empty_inputs_are_rejected() {
    assert!(matches!(
        build_evaluation_prompt(&[], "글", Strictness::Normal),
        Err(CheckmateError::InvalidInput(_))
    ));
    assert!(matches!(
        build_evaluation_prompt(&reqs(), " \t\n", Strictness::Normal),
        Err(CheckmateError::InvalidInput(_))
    ));
}

#[test]
fn strictness_levels_are_closed() {
    assert_eq!(Strictness::try_from(1u8).unwrap(), Strictness::Lenient);
    assert_eq!(Strictness::try_from(2u8).unwrap(), Strictness::Normal);
    assert_eq!(Strictness::try_from(3u8).unwrap(), Strictness::Strict);
    assert!(Strictness::try_from(0u8).is_err());
    assert!(Strictness::try_from(4u8).is_err());
}
