pub const QUESTION_SYSTEM: &str = "You write practical programming exercises for technical interviews.";

/// Exercise generation. Replace: {context}, {n}
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Here is an excerpt from the technical knowledge base:
{context}

Generate {n} practical exercises in English based only on this content.

Each exercise must follow exactly this format:

Exercise: [Clear and short title]
Description: [Complete explanation of the task, with details on expected inputs, outputs,
and any constraints. Write as an assignment instruction.]

Constraints:
- Do not use automatic numbering (no 1., 2., etc.).
- Respond only with the exercises, nothing else.
- Do not use input() calls. Exercises must define input values as variables or parameters
already provided, never through user interaction."#;

/// Reference answer. Replace: {question}
pub const ANSWER_PROMPT_TEMPLATE: &str = r#"Answer this programming question in a clear and educational way:

Question: {question}

Provide a complete answer with:
1. Explanation of the concept
2. Code example if applicable
3. Best practices"#;

/// Used when the model is unreachable or returns no parsable exercise.
pub const FALLBACK_EXERCISES: &[&str] = &[
    "Exercise: Sum of two numbers\n\
     Description: Write a Python function that returns the sum of two given numbers. \
     Define both numbers as variables at the top of your code (for example, number1 = 5 \
     and number2 = 3). Test your function by printing the result with print().",
    "Exercise: Parity check\n\
     Description: Write a Python function that tells whether a given number is even or odd. \
     Define the number as a variable at the top of your code (for example, number = 7). \
     The function must return the string \"even\" or \"odd\". Test your function by printing \
     the result with print().",
    "Exercise: Largest of three numbers\n\
     Description: Write a Python function that finds the largest of three given numbers. \
     Define the three numbers as variables at the top of your code (for example, a = 10, \
     b = 25, c = 15). The function must return the largest value. Test your function by \
     printing the result with print().",
];
