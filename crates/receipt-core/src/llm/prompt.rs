//! Natural-language instructions sent alongside the receipt images.

/// Key the batch prompt asks the model to put on every array element.
pub const INDEX_KEY: &str = "image_index";

/// Key holding the extracted payload inside a batch array element.
pub const DATA_KEY: &str = "data";

/// Instruction for a request carrying exactly one receipt image.
pub const SINGLE_PROMPT: &str = "\
# ROLE AND GOAL
You are an autonomous system for intelligent data extraction from documents. \
Analyze the attached receipt image, understand its structure and convert ALL of \
its information into a logically organized JSON document. Every receipt is \
different, so do not rely on a fixed template but on your understanding of the context.

# METHOD
Work like a person trying to organize the data into a clear structure:
1. **Map the document:** Go through the whole receipt and identify visually and \
logically separate blocks of information (merchant header, list of items, payment \
summary, transaction details, tax breakdown, barcode and so on).
2. **Transcribe precisely:** Be as accurate as possible. Double-check difficult words and numbers.
3. **Group logically:** Produce a JSON array where each object represents one logical \
block identified in step 1.
4. **Create your own labels:** Give every block a descriptive name under the key \
`\"type\"` and give every value inside a block a clear, consistent key \
(for example `\"vat_rate\"`, `\"total_amount\"`, `\"item_name\"`).
5. **Leave nothing out:** Make sure ALL information on the receipt is transcribed, \
including numeric codes, notes and other details.

# EXAMPLE OF THINKING (not of the format!)
- \"This is clearly the header, I will call it 'merchant_information'.\"
- \"The list of goods starts here. Every line becomes its own object of type 'purchase_item'.\"
- \"A VAT section. I will call it 'tax_breakdown' with keys 'rate', 'base', 'tax'.\"
- \"A long number under the lines at the end is probably an internal code or EAN. \
I will call it 'document_identifier'.\"
- \"Card payment details belong together, they get a 'payment_transaction_details' block.\"

# FINAL INSTRUCTION
Apply this method to the attached receipt. Produce a logical, clear and complete JSON \
transcription. Do not imitate any particular example, create the best structure for \
the data you see. Start generating:";

/// Instruction for a request carrying several receipt images.
pub const BATCH_PROMPT: &str = "\
# ROLE AND GOAL
You are an expert system for extracting data from several documents at once. \
Analyze ALL attached receipt images. For EACH image extract all of its information \
into a separate JSON object, then wrap all of these objects in one top-level JSON array.

# METHOD
1. **Iterate over the images:** Go through every image you were sent, in order.
2. **Analyze each image on its own:** For every single image:
   - map the document and identify the blocks of information
   - transcribe all data precisely
   - build a logically structured JSON object
   - add an identifier: put the key \"image_index\" with the zero-based position \
of the image (0, 1, 2...) into the object
3. **Assemble the output:** Produce an array of JSON objects in the form \
[{\"image_index\": 0, \"data\": {...}}, {\"image_index\": 1, \"data\": {...}}, ...]

# FINAL INSTRUCTION
Apply this method to ALL attached images. Produce ONE JSON output containing an \
array with one object per image.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_prompt_names_index_and_data_keys() {
        assert!(BATCH_PROMPT.contains(&format!("\"{INDEX_KEY}\"")));
        assert!(BATCH_PROMPT.contains(&format!("\"{DATA_KEY}\"")));
    }

    #[test]
    fn test_single_prompt_asks_for_json() {
        assert!(SINGLE_PROMPT.contains("JSON"));
        assert!(!SINGLE_PROMPT.contains(INDEX_KEY));
    }
}
