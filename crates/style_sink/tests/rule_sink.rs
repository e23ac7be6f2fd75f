use style_sink::{MAX_SIZE, RuleSink};

#[test]
fn rewriting_a_class_replaces_its_slot() {
    let mut sink = RuleSink::new();
    let first = sink.write("btn", ".btn{color:red}");
    let second = sink.write("btn", ".btn{color:blue}");

    assert_eq!(first, second);
    assert_eq!(sink.slot_count(), 1);
    assert_eq!(sink.rule("btn"), Some(".btn{color:blue}"));
    assert_eq!(sink.to_css_string(), ".btn{color:blue}");
}

#[test]
fn exceeding_max_size_rotates_to_a_new_container() {
    let mut sink = RuleSink::new();
    for index in 0..=MAX_SIZE {
        let class_name = format!("c{index}");
        sink.write(&class_name, &format!(".{class_name}{{}}"));
    }

    assert_eq!(sink.container_count(), 2);
    assert_eq!(sink.slot_count(), MAX_SIZE + 1);
    assert_eq!(sink.container_of("c0"), Some(0));
    assert_eq!(sink.container_of(&format!("c{}", MAX_SIZE - 1)), Some(0));
    assert_eq!(sink.container_of(&format!("c{MAX_SIZE}")), Some(1));
}

#[test]
fn small_containers_rotate_in_order() {
    let mut sink = RuleSink::with_container_capacity(2);
    for name in ["a", "b", "c", "d", "e"] {
        sink.write(name, &format!(".{name}{{}}"));
    }
    assert_eq!(sink.container_count(), 3);
    assert_eq!(sink.container_of("b"), Some(0));
    assert_eq!(sink.container_of("c"), Some(1));
    assert_eq!(sink.container_of("e"), Some(2));

    // In-place updates never allocate.
    sink.write("a", ".a{x:y}");
    assert_eq!(sink.container_count(), 3);
    assert_eq!(sink.to_css_string(), ".a{x:y}\n.b{}\n.c{}\n.d{}\n.e{}");
}

#[test]
fn remove_deletes_and_tolerates_missing_classes() {
    let mut sink = RuleSink::new();
    sink.write("a", ".a{}");
    sink.write("b", ".b{}");

    assert!(sink.remove("a"));
    assert!(!sink.remove("a"));
    assert!(!sink.remove("never-written"));
    assert_eq!(sink.rule("a"), None);
    assert_eq!(sink.slot_count(), 1);
    assert_eq!(sink.to_css_string(), ".b{}");

    // A removed class gets a fresh slot when written again.
    sink.write("a", ".a{color:red}");
    assert_eq!(sink.slot_count(), 2);
    assert_eq!(sink.rule("a"), Some(".a{color:red}"));
}

#[test]
fn zero_capacity_is_treated_as_one() {
    let mut sink = RuleSink::with_container_capacity(0);
    sink.write("a", ".a{}");
    sink.write("b", ".b{}");
    assert_eq!(sink.container_count(), 2);
}

#[test]
fn removing_a_class_leaves_rules_nested_under_it() {
    let mut sink = RuleSink::new();
    sink.write("x", ".foo .x{color:red}");

    assert!(!sink.remove("foo"));
    assert!(!sink.remove("foo"));
    assert_eq!(sink.rule("x"), Some(".foo .x{color:red}"));
    assert_eq!(sink.slot_count(), 1);

    sink.write("x", ".foo .x{color:blue}");
    assert_eq!(sink.slot_count(), 1);
    assert!(sink.remove("x"));
    assert_eq!(sink.slot_count(), 0);
    assert!(!sink.remove("x"));
}

#[test]
fn unowned_rules_are_removed_by_selector() {
    let mut sink = RuleSink::new();
    sink.write("title", ".card .title{}");
    sink.append(".card-lg{}");
    sink.append(".card:hover{color:red}");

    assert!(sink.remove("card"));
    assert_eq!(sink.to_css_string(), ".card .title{}\n.card-lg{}");
    assert!(!sink.remove("card"));
    assert_eq!(sink.rule("title"), Some(".card .title{}"));
    assert_eq!(sink.slot_count(), 2);
}

#[test]
fn remove_then_write_cycles_reuse_slots() {
    let mut sink = RuleSink::with_container_capacity(4);
    sink.write("keep", ".keep{}");
    for _ in 0..1000 {
        sink.write("a", ".a{}");
        sink.write("b", ".b{}");
        assert!(sink.remove("a"));
        assert!(sink.remove("b"));
    }
    assert_eq!(sink.container_count(), 1);
    assert_eq!(sink.slot_count(), 1);
    assert_eq!(sink.to_css_string(), ".keep{}");
}
