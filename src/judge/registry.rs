use crate::config::settings::VerifierSettings;
use crate::config::types::{Result, VerifyError};
use crate::judge::languages::{
    javascript::JavaScriptAdapter, python::PythonAdapter, typescript::TypeScriptAdapter,
};
use crate::judge::{LanguageAdapter, LanguageInfo, LanguageTag};

pub fn adapter_for(language: &str, settings: &VerifierSettings) -> Result<Box<dyn LanguageAdapter>> {
    let tag = LanguageTag::from_slug(language)
        .ok_or_else(|| VerifyError::UnsupportedLanguage(language.to_string()))?;
    Ok(build(tag, settings))
}

pub fn adapter_for_extension(
    extension: &str,
    settings: &VerifierSettings,
) -> Result<Box<dyn LanguageAdapter>> {
    let tag = LanguageTag::from_extension(extension).ok_or_else(|| {
        VerifyError::UnsupportedLanguage(format!("no language for extension `{}`", extension))
    })?;
    Ok(build(tag, settings))
}

pub fn supported_languages() -> Vec<LanguageInfo> {
    LanguageTag::ALL.iter().map(LanguageTag::info).collect()
}

fn build(tag: LanguageTag, settings: &VerifierSettings) -> Box<dyn LanguageAdapter> {
    let slug = tag.slug();
    let interpreter = settings.interpreter_for(slug).map(str::to_string);
    let extra_args = settings.extra_args_for(slug).to_vec();
    match tag {
        LanguageTag::Python => Box::new(PythonAdapter::new(interpreter, extra_args)),
        LanguageTag::JavaScript => Box::new(JavaScriptAdapter::new(interpreter, extra_args)),
        LanguageTag::TypeScript => Box::new(TypeScriptAdapter::new(interpreter, extra_args)),
    }
}
