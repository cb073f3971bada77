pub mod openai_compatible;
