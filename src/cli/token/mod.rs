//! Token command - mints a caller token signed with the configured secret

use clap::Args;

use crate::config::AppConfig;
use crate::domain::caller::Caller;
use crate::domain::team::MemberId;
use crate::infrastructure::auth::JwtService;

#[derive(Args, Debug, Clone)]
pub struct TokenArgs {
    /// Member id placed in the `sub` claim
    #[arg(long)]
    pub member: String,

    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,
}

/// Prints the token on stdout; logging stays off so the output can be piped
pub fn run(args: TokenArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let jwt_service = JwtService::new(config.auth.jwt_config());

    println!("{}", mint(&jwt_service, &args)?);
    Ok(())
}

pub fn mint(jwt_service: &JwtService, args: &TokenArgs) -> anyhow::Result<String> {
    let caller = Caller::new(
        MemberId::new(args.member.as_str())?,
        args.name.as_str(),
        args.email.as_str(),
    );

    Ok(jwt_service.issue(&caller)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::auth::JwtConfig;

    fn args(member: &str) -> TokenArgs {
        TokenArgs {
            member: member.to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    #[test]
    fn test_minted_token_validates() {
        let jwt_service = JwtService::new(JwtConfig::new("cli-secret", 2));

        let token = mint(&jwt_service, &args("ana")).unwrap();
        let claims = jwt_service.validate(&token).unwrap();

        assert_eq!(claims.sub, "ana");
        assert_eq!(claims.email, "ana@example.com");
    }

    #[test]
    fn test_invalid_member_id_is_rejected() {
        let jwt_service = JwtService::new(JwtConfig::new("cli-secret", 2));

        assert!(mint(&jwt_service, &args("")).is_err());
    }
}
