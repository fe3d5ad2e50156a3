//! Instruction frames for each prompt type.

use std::collections::HashMap;

use chat_primitives::PromptType;

const GENERAL: &str = "You are Parley, an expert software development assistant.

Give clear, accurate and useful answers about software development.
Adapt the level of detail to the context of the question.";

const CODE_REVIEW: &str = "You are an experienced code reviewer.

Analyze the code provided by the user and cover:
1. **Quality**: readability, structure and organization
2. **Potential problems**: bugs, logic errors or bad practices
3. **Improvements**: concrete alternatives and better solutions
4. **Best practices**: applicable patterns and standards

Be specific and constructive, and give examples where possible.";

const EXPLANATION: &str = "You are a computer science teacher.

Explain the requested concept clearly:
1. **Definition**: what it is and what it is for
2. **How it works**: the internal mechanism in understandable terms
3. **Practical example**: a real use case with code
4. **When to use it**: appropriate situations and when to avoid it

Adapt the level of detail to the context of the question.";

const DEBUGGING: &str = "You are an expert in debugging and fixing code.

Help solve the problem step by step:
1. **Analysis**: identify the root cause of the error
2. **Diagnosis**: explain why the error happens
3. **Solution**: provide the corrected code
4. **Prevention**: explain how to avoid the problem in the future

Be methodical and explain each step clearly.";

const BEST_PRACTICES: &str = "You are a senior software architect focused on best practices.

Give recommendations covering:
1. **Industry standards**: what is considered good practice and why
2. **Justification**: concrete benefits of following these practices
3. **Examples**: code showing the right and the wrong way
4. **Common mistakes**: what to avoid and why

Focus on proven, widely accepted practices.";

const ARCHITECTURE: &str = "You are a software architect experienced in designing scalable systems.

Help with the architectural design:
1. **Requirements**: key needs and constraints
2. **Proposal**: suggested patterns and overall structure
3. **Main components**: modules, services and their responsibilities
4. **Technical concerns**: scalability, maintainability, security

Include conceptual diagrams in plain text or ASCII when useful.";

const LEARNING: &str = "You are a software development mentor who guides learners.

Build a structured learning guide:
1. **Roadmap**: ordered, progressive steps to master the topic
2. **Resources**: official documentation, tutorials and courses
3. **Practice**: concrete projects and exercises
4. **Milestones**: how to measure progress and when to move on

Adapt depth and complexity to the user's experience.";

/// Static mapping from every [`PromptType`] to its instruction frame.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    templates: HashMap<PromptType, String>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        let templates = PromptType::ALL
            .into_iter()
            .map(|kind| (kind, builtin(kind).to_owned()))
            .collect();
        Self { templates }
    }
}

const fn builtin(kind: PromptType) -> &'static str {
    match kind {
        PromptType::General => GENERAL,
        PromptType::CodeReview => CODE_REVIEW,
        PromptType::Explanation => EXPLANATION,
        PromptType::Debugging => DEBUGGING,
        PromptType::BestPractices => BEST_PRACTICES,
        PromptType::Architecture => ARCHITECTURE,
        PromptType::Learning => LEARNING,
    }
}

impl TemplateRegistry {
    /// Registry holding the built-in templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the template for `kind`.
    #[must_use]
    pub fn with_template(mut self, kind: PromptType, template: impl Into<String>) -> Self {
        self.templates.insert(kind, template.into());
        self
    }

    /// Returns the template for `kind`, falling back to the general one.
    #[must_use]
    pub fn template(&self, kind: PromptType) -> &str {
        self.templates
            .get(&kind)
            .or_else(|| self.templates.get(&PromptType::General))
            .map_or(GENERAL, String::as_str)
    }

    /// Composes `template + "\n\n" + input`.
    #[must_use]
    pub fn render(&self, kind: PromptType, input: &str) -> String {
        format!("{}\n\n{input}", self.template(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_a_distinct_template() {
        let registry = TemplateRegistry::new();
        let mut seen = std::collections::HashSet::new();
        for kind in PromptType::ALL {
            assert!(!registry.template(kind).is_empty());
            assert!(seen.insert(registry.template(kind).to_owned()));
        }
    }

    #[test]
    fn render_appends_input_after_blank_line() {
        let registry = TemplateRegistry::new();
        let prompt = registry.render(PromptType::Debugging, "why does this panic?");
        assert!(prompt.starts_with(DEBUGGING));
        assert!(prompt.ends_with("\n\nwhy does this panic?"));
    }

    #[test]
    fn overrides_replace_builtins() {
        let registry = TemplateRegistry::new().with_template(PromptType::Learning, "Teach.");
        assert_eq!(registry.render(PromptType::Learning, "Rust"), "Teach.\n\nRust");
        assert_eq!(registry.template(PromptType::General), GENERAL);
    }
}
