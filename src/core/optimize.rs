use crate::core::ast::{Element, Rule};

pub fn optimize(rule: &Rule) -> Rule {
    rule.with_element(optimize_element(rule.element()))
}

pub fn optimize_all(rules: &[Rule]) -> Vec<Rule> {
    rules.iter().map(optimize).collect()
}

/// Rewrites `element` bottom-up into a smaller tree matching the same language. Running
/// it on its own output changes nothing.
pub fn optimize_element(element: &Element) -> Element {
    match element {
        Element::RuleName(_) | Element::Terminal(_) => element.clone(),
        Element::Repetition { min, max, element } => match (*min, *max) {
            (0, Some(0)) => Element::empty(),
            (1, Some(1)) => optimize_element(element),
            (min, max) => Element::Repetition {
                min,
                max,
                element: Box::new(optimize_element(element)),
            },
        },
        Element::Concatenation(elements) => {
            let mut elements: Vec<Element> = elements.iter().map(optimize_element).collect();
            if elements.len() == 1 {
                elements.remove(0)
            } else {
                Element::Concatenation(elements)
            }
        }
        Element::Alternation(elements) => {
            let mut merged: Vec<Element> = Vec::with_capacity(elements.len());
            for element in elements.iter().map(optimize_element) {
                let last = merged.pop();
                match (last, element) {
                    (Some(Element::Terminal(left)), Element::Terminal(right))
                        if !left.is_empty() && !right.is_empty() =>
                    {
                        merged.push(Element::Terminal(left | right))
                    }
                    (last, element) => {
                        merged.extend(last);
                        merged.push(element);
                    }
                }
            }

            if merged.len() == 1 {
                merged.remove(0)
            } else {
                Element::Alternation(merged)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::core::{
            ast::{build::*, core_rules::CORE_RULES},
            charset::CharSet,
        },
    };

    #[test]
    fn repetition_zero_is_empty() {
        //setup
        let element = repeat(0, Some(0), name("pchar"));

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, Element::empty());
    }

    #[test]
    fn repetition_once_unwraps() {
        //setup
        let element = repeat(1, Some(1), repeat(1, Some(1), name("a")));

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, name("a"));
    }

    #[test]
    fn singleton_concatenation_collapses() {
        //setup
        let element = seq(vec![repeat(1, Some(1), seq(vec![name("a"), name("b")]))]);

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, seq(vec![name("a"), name("b")]));
    }

    #[test]
    fn adjacent_terminals_merge() {
        //setup
        let element = alt(vec![
            chars("a"),
            chars("b"),
            name("x"),
            repeat(1, Some(1), chars("c")),
            chars("d"),
        ]);

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, alt(vec![chars("ab"), name("x"), chars("cd")]));
    }

    #[test]
    fn all_terminals_merge_to_terminal() {
        //setup
        let element = alt(vec![range('A', 'Z'), range('a', 'z')]);

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(
            res,
            Element::Terminal(CharSet::of_range('A', 'Z') | CharSet::of_range('a', 'z'))
        );
    }

    #[test]
    fn empty_terminal_never_merges() {
        //setup
        let element = alt(vec![chars("a"), Element::empty(), chars("b")]);

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, element);
    }

    #[test]
    fn concatenation_branches_keep_order() {
        //setup
        let element = alt(vec![
            seq(vec![chars("2"), chars("5")]),
            chars("2"),
            seq(vec![chars("1"), chars("0")]),
        ]);

        //exercise
        let res = optimize_element(&element);

        //verify
        assert_eq!(res, element);
    }

    #[test]
    fn optimize_is_idempotent() {
        //setup
        let mut rules: Vec<Rule> = CORE_RULES.clone();
        rules.push(rule(
            "nested",
            alt(vec![
                repeat(1, Some(1), chars("a")),
                repeat(1, Some(1), alt(vec![chars("b"), chars("c")])),
                seq(vec![repeat(0, Some(0), name("x")), repeat(1, Some(1), chars("d"))]),
                chars("e"),
                optional(alt(vec![chars("f"), repeat(1, Some(1), chars("g"))])),
            ]),
        ));

        for rule in &rules {
            //exercise
            let once = optimize(rule);
            let twice = optimize(&once);

            //verify
            assert_eq!(once, twice, "{}", rule);
        }
    }
}
