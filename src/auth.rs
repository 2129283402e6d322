//! Login form rules and the identity provider's error messages.
use thiserror::Error;

const MIN_PASSWORD_LEN: usize = 6;

/// Errors reported by the identity provider, keyed by its error codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Este correo electrónico ya está registrado")]
    EmailAlreadyInUse,
    #[error("El correo electrónico no es válido")]
    InvalidEmail,
    #[error("Operación no permitida")]
    OperationNotAllowed,
    #[error("La contraseña es muy débil. Debe tener al menos 6 caracteres")]
    WeakPassword,
    #[error("Este usuario ha sido deshabilitado")]
    UserDisabled,
    #[error("No se encontró una cuenta con este correo electrónico")]
    UserNotFound,
    #[error("Contraseña incorrecta")]
    WrongPassword,
    #[error("Credenciales inválidas")]
    InvalidCredential,
    #[error("Demasiados intentos fallidos. Por favor, intenta más tarde")]
    TooManyRequests,
    #[error("Error de conexión. Verifica tu conexión a internet")]
    NetworkRequestFailed,
    #[error("Ocurrió un error. Por favor, intenta de nuevo")]
    Unknown(String),
}

impl AuthError {
    pub fn from_code(code: &str) -> Self {
        match code {
            "auth/email-already-in-use" => AuthError::EmailAlreadyInUse,
            "auth/invalid-email" => AuthError::InvalidEmail,
            "auth/operation-not-allowed" => AuthError::OperationNotAllowed,
            "auth/weak-password" => AuthError::WeakPassword,
            "auth/user-disabled" => AuthError::UserDisabled,
            "auth/user-not-found" => AuthError::UserNotFound,
            "auth/wrong-password" => AuthError::WrongPassword,
            "auth/invalid-credential" => AuthError::InvalidCredential,
            "auth/too-many-requests" => AuthError::TooManyRequests,
            "auth/network-request-failed" => AuthError::NetworkRequestFailed,
            other => AuthError::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Por favor, ingresa tu correo electrónico")]
    MissingEmail,
    #[error("Por favor, ingresa un correo electrónico válido")]
    MalformedEmail,
    #[error("Por favor, ingresa tu contraseña")]
    MissingPassword,
    #[error("La contraseña debe tener al menos 6 caracteres")]
    PasswordTooShort,
    #[error("Por favor, confirma tu contraseña")]
    MissingConfirmation,
    #[error("Las contraseñas no coinciden")]
    PasswordMismatch,
}

/// Checks the login/register form before anything is sent to the provider.
/// The first failing rule wins.
pub fn validate_credentials(
    mode: FormMode,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !is_email_shaped(email) {
        return Err(ValidationError::MalformedEmail);
    }
    if password.trim().is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if mode == FormMode::Register {
        if confirm.trim().is_empty() {
            return Err(ValidationError::MissingConfirmation);
        }
        if confirm != password {
            return Err(ValidationError::PasswordMismatch);
        }
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace and exactly one `@`. The domain
/// needs a dot with at least one character on each side.
fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
