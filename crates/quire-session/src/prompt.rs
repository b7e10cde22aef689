//! Analysis request templates

use crate::generator::Prompt;

const ANALYST_ROLE: &str = "You are a data analysis expert.";

/// Automatic overview of the merged table
pub(crate) fn summary(csv: &str, temperature: f32) -> Prompt {
    Prompt {
        system: format!("{ANALYST_ROLE} Extract the insights the data supports."),
        user: format!(
            "Below is a table the user merged from spreadsheets. Summarize its key \
             statistics, trends and patterns.\n\n[CSV data]\n{csv}\n"
        ),
        temperature,
    }
}

/// Free-text question about the merged table
pub(crate) fn question(csv: &str, question: &str, temperature: f32) -> Prompt {
    Prompt {
        system: ANALYST_ROLE.to_string(),
        user: format!(
            "Below is the user's spreadsheet data as CSV. Analyze it and answer the \
             question.\n\n[CSV data]\n{csv}\n\n[Question]\n{question}\n"
        ),
        temperature,
    }
}

/// Chart request; the reply is expected to be a program
pub(crate) fn visualization(
    csv: &str,
    request: &str,
    table_name: &str,
    temperature: f32,
) -> Prompt {
    Prompt {
        system: ANALYST_ROLE.to_string(),
        user: format!(
            "Below is the user's spreadsheet data as CSV. Answer the visualization \
             request with Python code.\n\n\
             [Rules]\n\
             1. `{table_name}` is already defined; use it directly and do not rebuild it\n\
             2. Output nothing but the code\n\
             3. Use matplotlib.pyplot and pandas only\n\
             4. Any explanatory text must be a comment starting with #\n\n\
             [CSV data]\n{csv}\n\n[Visualization request]\n{request}\n"
        ),
        temperature,
    }
}
