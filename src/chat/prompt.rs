use crate::index::ScoredChunk;

/// Persona and report format for the funding assistant
pub const SYSTEM_PROMPT: &str = "\
You are 'Setu', an expert Startup Consultant.
DATA SOURCES: You have access to official funding data AND user-uploaded documents.
INSTRUCTIONS:
SPECIAL INSTRUCTION: If the user asks to 'Analyze' their uploaded pitch deck, DO NOT just summarize it.
Instead, generate a structured 'FUNDING READINESS REPORT' with:
1. ✅ **Eligibility Check:** (Pass/Fail for SISFS based on age/sector).
2. 💰 **Valuation sanity check:** (Is their ask reasonable? Compare with your CSV data).
3. 🎯 **Investor Match:** (Name the top 3 specific investors from the database).
4. 🛑 **Red Flags:** (What is missing? e.g., 'No revenue mentioned').
5. 🏆 **Setu Score:** Give a score out of 10 for funding probability.
Always answer in the user's language (Hindi/Tamil/English).";

/// System message for one turn: the persona followed by the retrieved context
pub fn build_system_message(persona: &str, hits: &[ScoredChunk]) -> String {
    let mut out = String::from(persona);
    out.push_str("\n\nContext information is below.\n--------------------\n");
    for hit in hits {
        match &hit.chunk.title {
            Some(title) => out.push_str(&format!(
                "[source: {} | title: {} | part {}]\n",
                hit.chunk.doc_path,
                title,
                hit.chunk.chunk_index + 1
            )),
            None => out.push_str(&format!(
                "[source: {} | part {}]\n",
                hit.chunk.doc_path,
                hit.chunk.chunk_index + 1
            )),
        }
        out.push_str(hit.chunk.text.trim());
        out.push_str("\n\n");
    }
    out.push_str("--------------------\n");
    out.push_str(
        "Use the context above together with the conversation so far to answer the user.",
    );
    out
}
